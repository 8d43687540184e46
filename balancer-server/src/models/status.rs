//! Status, recommendation and reset responses

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{
    utilization, workload_label, SafeModeConstraints, SafeModeRecommendation, SystemHealth,
    WorkloadLabel, WorkloadSnapshot,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystStatus {
    pub analyst_id: String,
    pub committed_minutes: u32,
    pub utilization: f64,
    pub status: WorkloadLabel,
}

impl AnalystStatus {
    pub fn from_snapshot(snapshot: &WorkloadSnapshot) -> Vec<Self> {
        snapshot
            .iter()
            .map(|(id, minutes)| {
                let utilization = utilization(minutes);
                Self {
                    analyst_id: id.to_string(),
                    committed_minutes: minutes,
                    utilization,
                    status: workload_label(utilization),
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub roster: String,
    pub analysts: Vec<AnalystStatus>,
    pub total_committed_minutes: u64,
    pub passes: u64,
    pub last_balanced_at: Option<DateTime<Utc>>,
    pub system_health: Option<SystemHealth>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub roster: String,
    pub recommendations: Vec<SafeModeRecommendation>,
    pub safe_mode_constraints: SafeModeConstraints,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub roster: String,
    pub reset: bool,
}
