//! Balancing pass handler

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::audit::AuditRecord;
use crate::engine::{fallback_result, run_pass, BalancingResult, EngineError, PassOptions};
use crate::models::{BalanceRequest, RosterQuery};
use crate::{AppError, AppResult, AppState};

/// Run one pass for the roster and commit it
pub async fn run(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
    payload: Result<Json<BalanceRequest>, JsonRejection>,
) -> AppResult<Json<BalancingResult>> {
    let Json(req) = payload?;
    req.validate()?;
    req.check_batch(state.config.max_batch_size)
        .map_err(AppError::ValidationError)?;

    let roster_id = query.id().to_string();
    let (options, analysts) = {
        let settings = state.settings.read();
        let options = PassOptions {
            algorithm: req.algorithm.unwrap_or(settings.algorithm),
            safe_mode: req.safe_mode,
            time_window_minutes: req
                .time_window_minutes
                .unwrap_or(state.config.default_time_window_minutes),
            constraints: settings.safe_mode_constraints.clone(),
        };
        (options, settings.resolve_roster(req.analysts))
    };

    let mut guard = state.store.lock_roster(&roster_id).await;

    let now = Utc::now();
    guard.settle(now);
    let snapshot = guard.effective_snapshot(req.workload.as_ref());
    let mut history = guard.recent_assignments();
    history.extend(req.recent_assignments);
    let threats = Arc::new(req.threats);

    tracing::debug!(
        "Balancing {} threats across {} analysts on roster '{}' ({})",
        threats.len(),
        analysts.len(),
        roster_id,
        options.algorithm
    );

    let pass = tokio::task::spawn_blocking({
        let threats = Arc::clone(&threats);
        let options = options.clone();
        move || run_pass(&threats, &analysts, &snapshot, &history, &options, now)
    });

    let timeout_secs = state.config.pass_timeout_secs;
    let outcome = match tokio::time::timeout(Duration::from_secs(timeout_secs), pass).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_err)) => Err(EngineError::WorkerFailed(join_err.to_string())),
        Err(_) => Err(EngineError::Timeout(timeout_secs)),
    };

    match outcome {
        Ok(outcome) => {
            let result = guard.commit(outcome).clone();
            drop(guard);

            tracing::info!(
                "Roster '{}': {}/{} threats assigned, health {:?}",
                roster_id,
                result.assigned_threats,
                result.total_threats,
                result.system_health.status
            );
            state.audit.record(AuditRecord::from_result(&roster_id, &result, None));
            Ok(Json(result))
        }
        Err(e) => {
            let message = e.to_string();
            let fallback = fallback_result(&threats, &options, now, &message);
            guard.record_failure(fallback.clone());
            drop(guard);

            state.audit.record(AuditRecord::from_result(&roster_id, &fallback, Some(message.clone())));
            Err(AppError::EngineError {
                message,
                fallback: Box::new(fallback),
            })
        }
    }
}
