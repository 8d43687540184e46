//! Workload status handler

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::models::{AnalystStatus, RosterQuery, StatusResponse};
use crate::AppState;

/// Per-analyst committed minutes and utilization. Unknown rosters report empty.
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Json<StatusResponse> {
    let mut response = StatusResponse {
        roster: query.id().to_string(),
        analysts: vec![],
        total_committed_minutes: 0,
        passes: 0,
        last_balanced_at: None,
        system_health: None,
    };

    let Some(roster) = state.store.get(query.id()) else {
        return Json(response);
    };
    let mut guard = roster.lock().await;
    guard.settle(Utc::now());

    response.analysts = AnalystStatus::from_snapshot(&guard.snapshot);
    response.total_committed_minutes = response.analysts.iter().map(|a| a.committed_minutes as u64).sum();
    response.passes = guard.passes;
    if let Some(last) = &guard.last_result {
        response.last_balanced_at = Some(last.generated_at);
        response.system_health = Some(last.system_health.clone());
    }

    Json(response)
}
