use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::pipeline_runs;
use crate::error::{AppError, AppResult};
use crate::jobs::scheduler;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 200;

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub id: Uuid,
    pub target_date: NaiveDate,
    pub trigger: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub readings: Option<i32>,
    pub unmatched: Option<i32>,
    pub unknown_role: Option<i32>,
    pub rows: RunRows,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunRows {
    pub soda: Option<i32>,
    pub ice_cream: Option<i32>,
    pub freezing: Option<i32>,
    pub conservation: Option<i32>,
    pub defrost_resistance: Option<i32>,
}

impl From<pipeline_runs::Model> for RunResponse {
    fn from(run: pipeline_runs::Model) -> Self {
        Self {
            id: run.id,
            target_date: run.target_date,
            trigger: run.trigger,
            status: run.status,
            started_at: run.started_at.with_timezone(&Utc),
            finished_at: run.finished_at.map(|t| t.with_timezone(&Utc)),
            readings: run.readings_count,
            unmatched: run.unmatched_count,
            unknown_role: run.unknown_role_count,
            rows: RunRows {
                soda: run.soda_rows,
                ice_cream: run.ice_cream_rows,
                freezing: run.freezing_rows,
                conservation: run.conservation_rows,
                defrost_resistance: run.defrost_rows,
            },
            error: run.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    /// Maximum number of runs to return (default 20, max 200)
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerRunRequest {
    /// Day to (re)process; readings are loaded for this local date
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct TriggerRunResponse {
    pub status: &'static str,
    pub date: NaiveDate,
}

/// List recent pipeline runs, newest first
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> AppResult<Json<Vec<RunResponse>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let runs = pipeline_runs::Entity::find()
        .order_by_desc(pipeline_runs::Column::StartedAt)
        .limit(limit)
        .all(state.db.as_ref())
        .await?;

    Ok(Json(runs.into_iter().map(RunResponse::from).collect()))
}

/// Most recent pipeline run
pub async fn latest_run(State(state): State<AppState>) -> AppResult<Json<RunResponse>> {
    let run = pipeline_runs::Entity::find()
        .order_by_desc(pipeline_runs::Column::StartedAt)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("No pipeline runs recorded".to_string()))?;

    Ok(Json(run.into()))
}

/// Start a run for a given date in the background
pub async fn trigger_run(
    State(state): State<AppState>,
    Json(request): Json<TriggerRunRequest>,
) -> AppResult<(StatusCode, Json<TriggerRunResponse>)> {
    let today = Utc::now().date_naive();
    if request.date > today {
        return Err(AppError::BadRequest(format!(
            "Cannot run for a future date: {}",
            request.date
        )));
    }

    scheduler::spawn_manual_run(state, request.date)?;
    tracing::info!(date = %request.date, "Manual pipeline run accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerRunResponse {
            status: "accepted",
            date: request.date,
        }),
    ))
}
