//! Engine configuration handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::settings::{EngineSettings, UpdateSettings};
use crate::{AppResult, AppState};

pub async fn get(State(state): State<AppState>) -> Json<EngineSettings> {
    Json(state.settings.read().clone())
}

/// Partial update; a rejected update keeps the current configuration
pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateSettings>, JsonRejection>,
) -> AppResult<Json<EngineSettings>> {
    let Json(update) = payload?;

    let mut settings = state.settings.write();
    let next = settings.merged(update)?;
    *settings = next.clone();
    drop(settings);

    tracing::info!(
        "Configuration updated: algorithm {}, {} analyst profiles",
        next.algorithm,
        next.analyst_profiles.len()
    );
    Ok(Json(next))
}
