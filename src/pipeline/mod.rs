//! Pure transformation core: join & normalize, classify, hourly aggregate.
//!
//! Nothing in here performs I/O or reads process state; every function is a
//! deterministic function of its inputs.

pub mod aggregate;
pub mod classify;
pub mod models;
pub mod normalize;
pub mod roles;

use serde::Serialize;

pub use aggregate::{aggregate, average};
pub use classify::Metric;
pub use models::{
    AverageRow, CatalogEntry, ClassifiedReading, DefrostRow, EnrichedReading, GroupKey, MetricRow,
    Reading,
};
pub use normalize::{JoinStats, normalize, normalize_with_stats};

/// The five output tables of one run, plus join diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub soda: Vec<MetricRow>,
    pub ice_cream: Vec<MetricRow>,
    pub freezing: Vec<AverageRow>,
    pub conservation: Vec<AverageRow>,
    pub defrost_resistance: Vec<DefrostRow>,
    pub stats: JoinStats,
}

impl PipelineOutput {
    #[must_use]
    pub fn row_count(&self, metric: Metric) -> usize {
        match metric {
            Metric::Soda => self.soda.len(),
            Metric::IceCream => self.ice_cream.len(),
            Metric::Freezing => self.freezing.len(),
            Metric::Conservation => self.conservation.len(),
            Metric::DefrostResistance => self.defrost_resistance.len(),
        }
    }
}

/// Run the whole core over one day's readings.
///
/// `readings` are expected in ascending timestamp order; output group order
/// follows it.
#[must_use]
pub fn transform(readings: &[Reading], catalog: &[CatalogEntry]) -> PipelineOutput {
    let (enriched, stats) = normalize_with_stats(readings, catalog);

    let soda = aggregate(&classify::classify_soda(&enriched));
    let ice_cream = aggregate(&classify::classify_ice_cream(&enriched));
    let freezing = average(classify::freezing_readings(&enriched));
    let conservation = average(classify::conservation_readings(&enriched));
    let defrost_resistance = classify::defrost_log(&enriched);

    let output = PipelineOutput {
        soda,
        ice_cream,
        freezing,
        conservation,
        defrost_resistance,
        stats,
    };

    tracing::debug!(
        readings = stats.readings_in,
        unmatched = stats.unmatched,
        unknown_role = stats.unknown_role,
        kept = stats.kept,
        "Transformation complete"
    );
    for metric in Metric::ALL {
        tracing::debug!(
            metric = metric.name(),
            rows = output.row_count(metric),
            "Output table ready"
        );
    }

    output
}
