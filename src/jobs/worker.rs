use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::pipeline_runs;
use crate::error::{AppError, AppResult};
use crate::load::{DbSink, LoadCounts, MetricSink};
use crate::pipeline::{self, JoinStats};
use crate::sources::{CatalogSource, ReadingSource};

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Scheduled,
    Manual,
}

impl RunTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// Outcome of one extract-transform-load pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub target_date: NaiveDate,
    pub stats: JoinStats,
    pub loaded: LoadCounts,
}

/// Extract the day's readings and the catalog, transform, and load every table.
///
/// # Errors
///
/// Returns an error if either source or the sink fails. The core itself never fails.
pub async fn run_pipeline(
    date: NaiveDate,
    readings: &dyn ReadingSource,
    catalog: &dyn CatalogSource,
    sink: &dyn MetricSink,
) -> AppResult<RunReport> {
    tracing::info!(%date, "Running pipeline");

    let (readings, catalog) =
        tokio::try_join!(readings.fetch_readings(date), catalog.fetch_catalog())?;

    let output = pipeline::transform(&readings, &catalog);

    if output.stats.unmatched > 0 {
        tracing::warn!(
            %date,
            unmatched = output.stats.unmatched,
            "Readings without a catalog entry were dropped"
        );
    }

    let loaded = sink.write_all(&output).await?;

    tracing::info!(
        %date,
        readings = output.stats.readings_in,
        kept = output.stats.kept,
        rows = loaded.total(),
        "Pipeline run loaded"
    );

    Ok(RunReport {
        target_date: date,
        stats: output.stats,
        loaded,
    })
}

/// Run the pipeline for `date` against the metrics store, recording it in `pipeline_runs`.
///
/// All five tables are written in one transaction: a failed run leaves no rows behind.
///
/// # Errors
///
/// Returns an error if the run cannot be recorded or the pipeline fails.
pub async fn execute_run(
    state: &AppState,
    date: NaiveDate,
    trigger: RunTrigger,
) -> AppResult<RunReport> {
    let run_id = start_run(&state.db, date, trigger).await?;

    let result = async {
        let txn = state.db.begin().await?;
        let sink = DbSink::new(&txn, run_id);
        let report = run_pipeline(
            date,
            state.readings.as_ref(),
            state.catalog.as_ref(),
            &sink,
        )
        .await?;
        txn.commit().await?;
        Ok::<_, AppError>(report)
    }
    .await;

    match &result {
        Ok(report) => update_run_success(&state.db, run_id, report).await,
        Err(e) => update_run_error(&state.db, run_id, &e.to_string()).await,
    }

    result
}

async fn start_run(
    db: &DatabaseConnection,
    date: NaiveDate,
    trigger: RunTrigger,
) -> AppResult<Uuid> {
    let run = pipeline_runs::ActiveModel {
        id: Set(Uuid::new_v4()),
        target_date: Set(date),
        trigger: Set(trigger.as_str().to_string()),
        status: Set("running".to_string()),
        started_at: Set(Utc::now().into()),
        finished_at: Set(None),
        readings_count: Set(None),
        unmatched_count: Set(None),
        unknown_role_count: Set(None),
        soda_rows: Set(None),
        ice_cream_rows: Set(None),
        freezing_rows: Set(None),
        conservation_rows: Set(None),
        defrost_rows: Set(None),
        error_message: Set(None),
    };

    let run = run.insert(db).await?;
    tracing::debug!(run_id = %run.id, %date, trigger = trigger.as_str(), "Recorded pipeline run");
    Ok(run.id)
}

fn as_count<T: TryInto<i32>>(value: T) -> Option<i32> {
    value.try_into().ok()
}

async fn update_run_success(db: &DatabaseConnection, run_id: Uuid, report: &RunReport) {
    let run = pipeline_runs::ActiveModel {
        id: Set(run_id),
        status: Set("success".to_string()),
        finished_at: Set(Some(Utc::now().into())),
        readings_count: Set(as_count(report.stats.readings_in)),
        unmatched_count: Set(as_count(report.stats.unmatched)),
        unknown_role_count: Set(as_count(report.stats.unknown_role)),
        soda_rows: Set(as_count(report.loaded.soda)),
        ice_cream_rows: Set(as_count(report.loaded.ice_cream)),
        freezing_rows: Set(as_count(report.loaded.freezing)),
        conservation_rows: Set(as_count(report.loaded.conservation)),
        defrost_rows: Set(as_count(report.loaded.defrost_resistance)),
        error_message: Set(None),
        ..Default::default()
    };

    if let Err(e) = run.update(db).await {
        tracing::warn!(run_id = %run_id, error = %e, "Failed to update pipeline run");
    }
}

async fn update_run_error(db: &DatabaseConnection, run_id: Uuid, error: &str) {
    let run = pipeline_runs::ActiveModel {
        id: Set(run_id),
        status: Set("error".to_string()),
        finished_at: Set(Some(Utc::now().into())),
        error_message: Set(Some(error.to_string())),
        ..Default::default()
    };

    if let Err(e) = run.update(db).await {
        tracing::warn!(run_id = %run_id, error = %e, "Failed to update pipeline run error");
    }
}
