use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::jobs::worker::{self, RunTrigger};

/// Next time the daily schedule fires strictly after `now`.
#[must_use]
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// A run processes the day before it fires.
#[must_use]
pub fn target_date_for(fire: DateTime<Utc>) -> NaiveDate {
    let day = fire.date_naive();
    day.pred_opt().unwrap_or(day)
}

/// Run the pipeline once a day at the configured time, for the previous day.
pub async fn run_daily(state: AppState) {
    let at = state.config.schedule_time;

    tracing::info!(
        schedule = %at.format("%H:%M"),
        run_on_startup = state.config.run_on_startup,
        "Starting daily pipeline scheduler"
    );

    if state.config.run_on_startup {
        run_with_retries(&state, target_date_for(Utc::now()), RunTrigger::Scheduled).await;
    }

    loop {
        let now = Utc::now();
        let next = next_run_after(now, at);
        let wait = (next - now).to_std().unwrap_or_default();

        tracing::debug!(next = %next, "Waiting for next scheduled run");
        tokio::time::sleep(wait).await;

        run_with_retries(&state, target_date_for(next), RunTrigger::Scheduled).await;
    }
}

/// Run the pipeline for `date`, retrying failed attempts.
///
/// Waits for any in-flight run to finish first. Returns whether a run succeeded.
pub async fn run_with_retries(state: &AppState, date: NaiveDate, trigger: RunTrigger) -> bool {
    let retry_delay_secs = state.config.retry_delay_seconds;
    let max_retries = state.config.retry_max;

    let _guard = state.run_lock.lock().await;

    let mut retries = 0;
    loop {
        match worker::execute_run(state, date, trigger).await {
            Ok(report) => {
                tracing::info!(
                    %date,
                    rows = report.loaded.total(),
                    "Pipeline run completed successfully"
                );
                return true;
            }
            Err(e) => {
                retries += 1;
                if retries <= max_retries {
                    tracing::error!(
                        error = %e,
                        %date,
                        retry = retries,
                        max_retries,
                        delay_secs = retry_delay_secs,
                        "Pipeline run failed, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(retry_delay_secs)).await;
                } else {
                    tracing::error!(
                        error = %e,
                        %date,
                        max_retries,
                        "Pipeline run failed after max retries"
                    );
                    return false;
                }
            }
        }
    }
}

/// Start a single run for `date` in the background.
///
/// # Errors
///
/// Returns `AppError::Conflict` if a run is already in progress.
pub fn spawn_manual_run(state: AppState, date: NaiveDate) -> AppResult<()> {
    let guard = state
        .run_lock
        .clone()
        .try_lock_owned()
        .map_err(|_| AppError::Conflict("A pipeline run is already in progress".to_string()))?;

    tokio::spawn(async move {
        let _guard = guard;
        match worker::execute_run(&state, date, RunTrigger::Manual).await {
            Ok(report) => tracing::info!(
                %date,
                rows = report.loaded.total(),
                "Manual pipeline run completed"
            ),
            Err(e) => tracing::error!(error = %e, %date, "Manual pipeline run failed"),
        }
    });

    Ok(())
}
