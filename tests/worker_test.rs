//! Pipeline runs against in-memory collaborators.
//!
//! Run with: cargo test --test worker_test

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use equipment_ops::error::{AppError, AppResult};
use equipment_ops::jobs::worker::run_pipeline;
use equipment_ops::load::{LoadCounts, MetricSink};
use equipment_ops::pipeline::roles::DeviceType;
use equipment_ops::pipeline::{AverageRow, CatalogEntry, DefrostRow, MetricRow, Reading};
use equipment_ops::sources::{CatalogSource, ReadingSource};

struct FixedReadings(Vec<Reading>);

#[async_trait]
impl ReadingSource for FixedReadings {
    async fn fetch_readings(&self, _date: NaiveDate) -> AppResult<Vec<Reading>> {
        Ok(self.0.clone())
    }
}

struct FailingReadings;

#[async_trait]
impl ReadingSource for FailingReadings {
    async fn fetch_readings(&self, date: NaiveDate) -> AppResult<Vec<Reading>> {
        Err(AppError::ReadingSource(format!("no files for {date}")))
    }
}

struct FixedCatalog(Vec<CatalogEntry>);

#[async_trait]
impl CatalogSource for FixedCatalog {
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogEntry>> {
        Ok(self.0.clone())
    }
}

/// Records every row it is asked to write.
#[derive(Default)]
struct MemorySink {
    soda: Mutex<Vec<MetricRow>>,
    ice_cream: Mutex<Vec<MetricRow>>,
    freezing: Mutex<Vec<AverageRow>>,
    conservation: Mutex<Vec<AverageRow>>,
    defrost: Mutex<Vec<DefrostRow>>,
}

fn append<T: Clone>(target: &Mutex<Vec<T>>, rows: &[T]) -> u64 {
    target.lock().unwrap().extend_from_slice(rows);
    rows.len() as u64
}

#[async_trait]
impl MetricSink for MemorySink {
    async fn write_soda(&self, rows: &[MetricRow]) -> AppResult<u64> {
        Ok(append(&self.soda, rows))
    }

    async fn write_ice_cream(&self, rows: &[MetricRow]) -> AppResult<u64> {
        Ok(append(&self.ice_cream, rows))
    }

    async fn write_freezing(&self, rows: &[AverageRow]) -> AppResult<u64> {
        Ok(append(&self.freezing, rows))
    }

    async fn write_conservation(&self, rows: &[AverageRow]) -> AppResult<u64> {
        Ok(append(&self.conservation, rows))
    }

    async fn write_defrost_resistance(&self, rows: &[DefrostRow]) -> AppResult<u64> {
        Ok(append(&self.defrost, rows))
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn catalog() -> Vec<CatalogEntry> {
    let entry = |sensor_id: &str, device_type: DeviceType, device_name: &str, sensor_name: &str| {
        CatalogEntry {
            sensor_id: sensor_id.to_string(),
            location_id: "L1".to_string(),
            sub_location_id: "SL1".to_string(),
            device_id: "D1".to_string(),
            device_type_id: device_type.id().to_string(),
            device_name: device_name.to_string(),
            sensor_type_id: "ST".to_string(),
            sensor_name: sensor_name.to_string(),
        }
    };
    vec![
        entry("S1", DeviceType::SodaDispenser, "Máquina de soda", "Fase 1"),
        entry("IC1", DeviceType::IceCreamMachine, "Máquina de nieve", "Temperatura"),
        entry("F1", DeviceType::FreezerRoomA, "Cuarto de congelación", "Temperatura congelación 1"),
        entry("F2", DeviceType::FreezerRoomA, "Cuarto de congelación", "Resistencia deshielo"),
        entry(
            "C1",
            DeviceType::ConservationRoomA,
            "Cuarto de conservación",
            "Temperatura conservacion",
        ),
    ]
}

fn readings() -> Vec<Reading> {
    let at = |h, m| date().and_hms_opt(h, m, 0).unwrap();
    vec![
        Reading::new("S1", 5.0, at(8, 15)),
        Reading::new("S1", 15.0, at(8, 45)),
        Reading::new("IC1", 4.0, at(10, 0)),
        Reading::new("F1", -18.0, at(10, 5)),
        Reading::new("F1", -20.0, at(10, 6)),
        Reading::new("F2", 230.0, at(10, 7)),
        Reading::new("C1", 3.0, at(10, 8)),
        Reading::new("ORPHAN", 1.0, at(10, 9)),
    ]
}

#[tokio::test]
async fn run_loads_every_table() {
    let sink = MemorySink::default();

    let report = run_pipeline(
        date(),
        &FixedReadings(readings()),
        &FixedCatalog(catalog()),
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(report.target_date, date());
    assert_eq!(
        report.loaded,
        LoadCounts {
            soda: 1,
            ice_cream: 1,
            freezing: 1,
            conservation: 1,
            defrost_resistance: 1,
        }
    );
    assert_eq!(report.loaded.total(), 5);
    assert_eq!(report.stats.readings_in, 8);
    assert_eq!(report.stats.unmatched, 1);

    let soda = sink.soda.lock().unwrap();
    assert_eq!(soda[0].operational_ratio, 0.5);
    assert_eq!(sink.freezing.lock().unwrap()[0].mean_value, -19.0);
    assert_eq!(sink.defrost.lock().unwrap()[0].value, 230.0);
}

#[tokio::test]
async fn rerunning_a_date_appends_again() {
    let sink = MemorySink::default();
    let source = FixedReadings(readings());
    let catalog = FixedCatalog(catalog());

    run_pipeline(date(), &source, &catalog, &sink).await.unwrap();
    run_pipeline(date(), &source, &catalog, &sink).await.unwrap();

    assert_eq!(sink.soda.lock().unwrap().len(), 2);
    assert_eq!(sink.defrost.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn source_failure_writes_nothing() {
    let sink = MemorySink::default();

    let err = run_pipeline(date(), &FailingReadings, &FixedCatalog(catalog()), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ReadingSource(_)));
    assert!(sink.soda.lock().unwrap().is_empty());
    assert!(sink.freezing.lock().unwrap().is_empty());
}
