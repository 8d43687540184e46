//! Workload reset handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::models::{ResetResponse, RosterQuery};
use crate::AppState;

/// Drop snapshot, history and last result for the roster
pub async fn reset(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Json<ResetResponse> {
    let removed = state.store.remove(query.id()).await;

    if removed {
        tracing::warn!("Workload reset for roster '{}'", query.id());
    }
    Json(ResetResponse {
        roster: query.id().to_string(),
        reset: removed,
    })
}
