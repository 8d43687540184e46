//! Recommendations handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::models::{RecommendationsResponse, RosterQuery};
use crate::AppState;

/// Recommendations from the latest pass plus the active constraints
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Json<RecommendationsResponse> {
    let safe_mode_constraints = state.settings.read().safe_mode_constraints.clone();
    let mut response = RecommendationsResponse {
        roster: query.id().to_string(),
        recommendations: vec![],
        safe_mode_constraints,
        generated_at: None,
    };

    if let Some(roster) = state.store.get(query.id()) {
        let guard = roster.lock().await;
        if let Some(last) = &guard.last_result {
            response.recommendations = last.recommendations.clone();
            response.generated_at = Some(last.generated_at);
        }
    }

    Json(response)
}
