//! Balance request model

use std::collections::HashSet;

use serde::Deserialize;
use validator::Validate;

use crate::engine::{Algorithm, Analyst, Incident, RecentAssignment, WorkloadSnapshot};
use crate::store::DEFAULT_ROSTER;

fn default_safe_mode() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    #[validate(nested)]
    pub threats: Vec<Incident>,

    #[validate(nested)]
    pub analysts: Vec<Analyst>,

    /// Falls back to the configured algorithm
    pub algorithm: Option<Algorithm>,

    #[serde(default = "default_safe_mode")]
    pub safe_mode: bool,

    #[validate(range(min = 1, max = 1440, message = "timeWindowMinutes must be within 1-1440"))]
    pub time_window_minutes: Option<u32>,

    /// Committed minutes reported by the caller, laid over the stored values
    #[serde(default)]
    pub workload: Option<WorkloadSnapshot>,

    #[serde(default)]
    pub recent_assignments: Vec<RecentAssignment>,
}

impl BalanceRequest {
    /// Checks serde and field rules cannot express
    pub fn check_batch(&self, max_batch_size: usize) -> Result<(), String> {
        if self.threats.len() > max_batch_size {
            return Err(format!(
                "batch of {} threats exceeds the limit of {}",
                self.threats.len(),
                max_batch_size
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.threats.iter().find(|t| !seen.insert(t.id.as_str())) {
            return Err(format!("duplicate threat id '{}'", dup.id));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.analysts.iter().find(|a| !seen.insert(a.id.as_str())) {
            return Err(format!("duplicate analyst id '{}'", dup.id));
        }

        Ok(())
    }
}

/// `?roster=` selector shared by every route
#[derive(Debug, Clone, Deserialize)]
pub struct RosterQuery {
    #[serde(default)]
    pub roster: Option<String>,
}

impl RosterQuery {
    pub fn id(&self) -> &str {
        self.roster
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ROSTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> BalanceRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = request(json!({ "threats": [], "analysts": [] }));
        assert!(req.safe_mode);
        assert!(req.algorithm.is_none());
        assert!(req.workload.is_none());
        assert!(req.recent_assignments.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_threats_must_be_a_sequence() {
        let parsed: Result<BalanceRequest, _> =
            serde_json::from_value(json!({ "threats": "t-1", "analysts": [] }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_duplicates_rejected() {
        let req = request(json!({
            "threats": [{ "id": "t-1" }, { "id": "t-1" }],
            "analysts": [{ "id": "a1" }]
        }));
        assert!(req.check_batch(10).unwrap_err().contains("t-1"));

        let req = request(json!({
            "threats": [{ "id": "t-1" }],
            "analysts": [{ "id": "a1" }, { "id": "a1" }]
        }));
        assert!(req.check_batch(10).unwrap_err().contains("a1"));
    }

    #[test]
    fn test_batch_limit() {
        let req = request(json!({ "threats": [{ "id": "t-1" }, { "id": "t-2" }], "analysts": [] }));
        assert!(req.check_batch(1).is_err());
        assert!(req.check_batch(2).is_ok());
    }

    #[test]
    fn test_invalid_window_and_nested_fields() {
        let req = request(json!({ "threats": [], "analysts": [], "timeWindowMinutes": 0 }));
        assert!(req.validate().is_err());

        let req = request(json!({ "threats": [{ "id": "t", "aiConfidence": 140 }], "analysts": [] }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_roster_query() {
        assert_eq!(RosterQuery { roster: None }.id(), "default");
        assert_eq!(RosterQuery { roster: Some("  ".into()) }.id(), "default");
        assert_eq!(RosterQuery { roster: Some("night".into()) }.id(), "night");
    }
}
