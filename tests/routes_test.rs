//! HTTP surface and database sink against a mock connection.
//!
//! Run with: cargo test --test routes_test

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use tower::ServiceExt;
use uuid::Uuid;

use equipment_ops::common::AppState;
use equipment_ops::config::{Config, Deployment};
use equipment_ops::entity::pipeline_runs;
use equipment_ops::error::AppResult;
use equipment_ops::load::{DbSink, MetricSink};
use equipment_ops::pipeline::{CatalogEntry, MetricRow, Reading};
use equipment_ops::routes::build_router;
use equipment_ops::sources::{CatalogSource, ReadingSource};

struct NoReadings;

#[async_trait]
impl ReadingSource for NoReadings {
    async fn fetch_readings(&self, _date: NaiveDate) -> AppResult<Vec<Reading>> {
        Ok(Vec::new())
    }
}

struct NoCatalog;

#[async_trait]
impl CatalogSource for NoCatalog {
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogEntry>> {
        Ok(Vec::new())
    }
}

fn test_config() -> Config {
    Config {
        database_url: "postgres://mock".to_string(),
        catalog_database_url: "postgres://mock".to_string(),
        readings_root: "/tmp/readings".into(),
        schedule_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
        run_on_startup: false,
        retry_max: 0,
        retry_delay_seconds: 0,
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        deployment: Deployment::Local,
    }
}

fn test_state(db: DatabaseConnection) -> AppState {
    AppState::new(
        Arc::new(db),
        test_config(),
        Arc::new(NoReadings),
        Arc::new(NoCatalog),
    )
}

fn finished_run() -> pipeline_runs::Model {
    let started = Utc.with_ymd_and_hms(2024, 1, 2, 12, 30, 0).unwrap();
    pipeline_runs::Model {
        id: Uuid::new_v4(),
        target_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        trigger: "scheduled".to_string(),
        status: "success".to_string(),
        started_at: started.fixed_offset(),
        finished_at: Some((started + Duration::seconds(42)).fixed_offset()),
        readings_count: Some(1200),
        unmatched_count: Some(3),
        unknown_role_count: Some(0),
        soda_rows: Some(16),
        ice_cream_rows: Some(16),
        freezing_rows: Some(24),
        conservation_rows: Some(24),
        defrost_rows: Some(300),
        error_message: None,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_run(date: NaiveDate) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/runs")
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"date":"{date}"}}"#)))
        .unwrap()
}

#[tokio::test]
async fn state_clones_share_one_connection() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = test_state(db);

    let cloned = state.clone();

    assert!(Arc::ptr_eq(&state.db, &cloned.db));
    assert!(Arc::ptr_eq(&state.run_lock, &cloned.run_lock));
}

#[tokio::test]
async fn healthz_is_ok() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = build_router(test_state(db));

    let response = app.oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn latest_run_is_not_found_before_any_run() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<pipeline_runs::Model>::new()])
        .into_connection();
    let app = build_router(test_state(db));

    let response = app.oneshot(get("/api/runs/latest")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn latest_run_reports_row_counts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![finished_run()]])
        .into_connection();
    let app = build_router(test_state(db));

    let response = app.oneshot(get("/api/runs/latest")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["target_date"], "2024-01-01");
    assert_eq!(json["status"], "success");
    assert_eq!(json["unmatched"], 3);
    assert_eq!(json["rows"]["defrost_resistance"], 300);
    assert!(json["error"].is_null());
}

#[tokio::test]
async fn list_runs_returns_array() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![finished_run(), finished_run()]])
        .into_connection();
    let app = build_router(test_state(db));

    let response = app.oneshot(get("/api/runs?limit=5")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn trigger_rejects_future_dates() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = build_router(test_state(db));
    let tomorrow = Utc::now().date_naive() + Duration::days(1);

    let response = app.oneshot(post_run(tomorrow)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trigger_conflicts_with_run_in_flight() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = test_state(db);
    let _running = state.run_lock.clone().lock_owned().await;
    let app = build_router(state);

    let response = app
        .oneshot(post_run(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn db_sink_reports_rows_written() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }])
        .into_connection();
    let sink = DbSink::new(&db, Uuid::new_v4());
    let row = |location: &str| MetricRow {
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        hour: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        location_id: location.to_string(),
        in_range_count: 1,
        out_of_range_count: 1,
        operational_ratio: 0.5,
    };

    let written = sink.write_soda(&[row("L1"), row("L2")]).await.unwrap();
    assert_eq!(written, 2);

    // Empty tables never reach the database.
    assert_eq!(sink.write_ice_cream(&[]).await.unwrap(), 0);
    assert_eq!(db.into_transaction_log().len(), 1);
}
