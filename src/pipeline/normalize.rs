use std::collections::HashMap;

use serde::Serialize;

use crate::pipeline::models::{CatalogEntry, EnrichedReading, Reading, hour_bucket};
use crate::pipeline::roles::{DeviceType, SensorRole};

/// Row accounting for one join pass.
///
/// `readings_in == unmatched + unknown_role + kept` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub readings_in: usize,
    /// Readings whose sensor id has no catalog entry.
    pub unmatched: usize,
    /// Matched readings whose sensor is not one of the consumed roles.
    pub unknown_role: usize,
    pub kept: usize,
}

/// Join readings to the catalog and keep only the consumed sensor roles.
///
/// Inner join on the uppercased sensor id; output keeps the reading order.
#[must_use]
pub fn normalize(readings: &[Reading], catalog: &[CatalogEntry]) -> Vec<EnrichedReading> {
    normalize_with_stats(readings, catalog).0
}

/// Same as [`normalize`], also reporting how many rows each filter dropped.
#[must_use]
pub fn normalize_with_stats(
    readings: &[Reading],
    catalog: &[CatalogEntry],
) -> (Vec<EnrichedReading>, JoinStats) {
    // Catalog ids are unique; on a duplicate the first entry wins.
    let mut index: HashMap<String, &CatalogEntry> = HashMap::with_capacity(catalog.len());
    for entry in catalog {
        index.entry(entry.sensor_id.to_uppercase()).or_insert(entry);
    }

    let mut stats = JoinStats {
        readings_in: readings.len(),
        ..JoinStats::default()
    };
    let mut enriched = Vec::with_capacity(readings.len());

    for reading in readings {
        let Some(entry) = index.get(&reading.sensor_id.to_uppercase()) else {
            stats.unmatched += 1;
            continue;
        };
        let Some(role) = SensorRole::from_name(&entry.sensor_name) else {
            stats.unknown_role += 1;
            continue;
        };

        let ts = reading.local_timestamp;
        enriched.push(EnrichedReading {
            sensor_id: entry.sensor_id.to_uppercase(),
            sensor_type_id: entry.sensor_type_id.clone(),
            local_timestamp: ts,
            date: ts.date(),
            hour: hour_bucket(ts),
            location_id: entry.location_id.clone(),
            sub_location_id: entry.sub_location_id.clone(),
            device_id: entry.device_id.clone(),
            device_type_id: entry.device_type_id.clone(),
            device_type: DeviceType::from_id(&entry.device_type_id),
            device_name: entry.device_name.clone(),
            sensor_name: entry.sensor_name.clone(),
            role,
            value: reading.value,
        });
    }

    stats.kept = enriched.len();
    (enriched, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn entry(sensor_id: &str, sensor_name: &str) -> CatalogEntry {
        CatalogEntry {
            sensor_id: sensor_id.to_string(),
            location_id: "L1".to_string(),
            sub_location_id: "SL1".to_string(),
            device_id: "D1".to_string(),
            device_type_id: DeviceType::SodaDispenser.id().to_lowercase(),
            device_name: "Máquina de soda".to_string(),
            sensor_type_id: "ST1".to_string(),
            sensor_name: sensor_name.to_string(),
        }
    }

    fn reading(sensor_id: &str, h: u32, m: u32) -> Reading {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        Reading::new(sensor_id, 1.0, ts)
    }

    #[test]
    fn join_is_case_insensitive_on_sensor_id() {
        let catalog = vec![entry("abc-1", "Fase 1")];
        let rows = normalize(&[reading("ABC-1", 8, 15)], &catalog);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sensor_id, "ABC-1");
        assert_eq!(rows[0].role, SensorRole::Phase1);
        assert_eq!(rows[0].device_type, Some(DeviceType::SodaDispenser));
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rows[0].hour, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn stats_account_for_every_dropped_row() {
        let catalog = vec![entry("S1", "Fase 2"), entry("S2", "Humedad")];
        let readings = vec![
            reading("S1", 8, 0),
            reading("S2", 8, 1),
            reading("S3", 8, 2),
            reading("S1", 9, 0),
        ];

        let (rows, stats) = normalize_with_stats(&readings, &catalog);

        assert_eq!(rows.len(), 2);
        assert_eq!(
            stats,
            JoinStats {
                readings_in: 4,
                unmatched: 1,
                unknown_role: 1,
                kept: 2,
            }
        );
    }

    #[test]
    fn output_preserves_reading_order() {
        let catalog = vec![entry("S1", "Fase 1"), entry("S2", "Fase 3")];
        let readings = vec![
            reading("S2", 7, 0),
            reading("S1", 7, 5),
            reading("S2", 7, 10),
        ];

        let ids: Vec<_> = normalize(&readings, &catalog)
            .into_iter()
            .map(|r| r.sensor_id)
            .collect();
        assert_eq!(ids, ["S2", "S1", "S2"]);
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        let (rows, stats) = normalize_with_stats(&[], &[]);
        assert!(rows.is_empty());
        assert_eq!(stats, JoinStats::default());
    }
}
