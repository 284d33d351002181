//! Output side of the pipeline: append-only writes of the five metric tables.

pub mod db;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;
use crate::pipeline::{AverageRow, DefrostRow, MetricRow, PipelineOutput};

pub use db::DbSink;

/// Rows written per output table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadCounts {
    pub soda: u64,
    pub ice_cream: u64,
    pub freezing: u64,
    pub conservation: u64,
    pub defrost_resistance: u64,
}

impl LoadCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.soda + self.ice_cream + self.freezing + self.conservation + self.defrost_resistance
    }
}

/// Destination for the metric tables.
///
/// Every write appends; nothing is deduplicated, so loading the same date
/// twice duplicates its rows.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn write_soda(&self, rows: &[MetricRow]) -> AppResult<u64>;
    async fn write_ice_cream(&self, rows: &[MetricRow]) -> AppResult<u64>;
    async fn write_freezing(&self, rows: &[AverageRow]) -> AppResult<u64>;
    async fn write_conservation(&self, rows: &[AverageRow]) -> AppResult<u64>;
    async fn write_defrost_resistance(&self, rows: &[DefrostRow]) -> AppResult<u64>;

    /// Write all five tables of a run, in a fixed order.
    async fn write_all(&self, output: &PipelineOutput) -> AppResult<LoadCounts> {
        Ok(LoadCounts {
            soda: self.write_soda(&output.soda).await?,
            ice_cream: self.write_ice_cream(&output.ice_cream).await?,
            freezing: self.write_freezing(&output.freezing).await?,
            conservation: self.write_conservation(&output.conservation).await?,
            defrost_resistance: self
                .write_defrost_resistance(&output.defrost_resistance)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{NaiveDate, NaiveTime};

    /// Remembers which table was written, in order.
    #[derive(Default)]
    struct OrderSink {
        calls: Mutex<Vec<&'static str>>,
    }

    impl OrderSink {
        fn record(&self, table: &'static str, rows: usize) -> AppResult<u64> {
            self.calls.lock().unwrap().push(table);
            Ok(rows as u64)
        }
    }

    #[async_trait]
    impl MetricSink for OrderSink {
        async fn write_soda(&self, rows: &[MetricRow]) -> AppResult<u64> {
            self.record("soda", rows.len())
        }
        async fn write_ice_cream(&self, rows: &[MetricRow]) -> AppResult<u64> {
            self.record("ice_cream", rows.len())
        }
        async fn write_freezing(&self, rows: &[AverageRow]) -> AppResult<u64> {
            self.record("freezing", rows.len())
        }
        async fn write_conservation(&self, rows: &[AverageRow]) -> AppResult<u64> {
            self.record("conservation", rows.len())
        }
        async fn write_defrost_resistance(&self, rows: &[DefrostRow]) -> AppResult<u64> {
            self.record("defrost_resistance", rows.len())
        }
    }

    #[test]
    fn write_all_writes_every_table_in_order() {
        let average = AverageRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            hour: NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
            location_id: "L1".to_string(),
            mean_value: -19.0,
        };
        let output = PipelineOutput {
            freezing: vec![average.clone(), average],
            ..PipelineOutput::default()
        };
        let sink = OrderSink::default();

        let counts = tokio_test::block_on(sink.write_all(&output)).unwrap();

        assert_eq!(counts.freezing, 2);
        assert_eq!(counts.total(), 2);
        assert_eq!(
            *sink.calls.lock().unwrap(),
            ["soda", "ice_cream", "freezing", "conservation", "defrost_resistance"]
        );
    }
}
