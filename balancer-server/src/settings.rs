//! Engine Settings
//!
//! Runtime balancing configuration: default algorithm, SAFE MODE constraints
//! and per-analyst profile overrides. Changed only through `PUT config`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::engine::{Algorithm, Analyst, Priority, RoleTier, SafeModeConstraints};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid safeModeConstraints: {0}")]
    InvalidConstraints(String),

    #[error("invalid profile for analyst '{id}': {reason}")]
    InvalidProfile { id: String, reason: String },
}

/// Partial analyst profile; present fields override the roster entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalystProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<RoleTier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specializations: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<BTreeMap<Priority, u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0, message = "fatigueResistance must be within 0-1"))]
    pub fatigue_resistance: Option<f64>,
}

impl AnalystProfile {
    pub fn apply(&self, analyst: &mut Analyst) {
        if let Some(name) = &self.name {
            analyst.name = name.clone();
        }
        if let Some(tier) = self.tier {
            analyst.tier = tier;
        }
        if let Some(specializations) = &self.specializations {
            analyst.specializations = specializations.clone();
        }
        if let Some(capacity) = &self.capacity {
            analyst.capacity = capacity.clone();
        }
        if let Some(resistance) = self.fatigue_resistance {
            analyst.fatigue_resistance = resistance;
        }
    }
}

/// Body of `PUT config`. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub algorithm: Option<Algorithm>,
    /// Merged key by key into the current constraints
    pub safe_mode_constraints: Option<serde_json::Map<String, serde_json::Value>>,
    /// Upserted per analyst id
    pub analyst_profiles: Option<HashMap<String, AnalystProfile>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    pub algorithm: Algorithm,
    pub safe_mode_constraints: SafeModeConstraints,
    pub analyst_profiles: BTreeMap<String, AnalystProfile>,
}

impl EngineSettings {
    /// Build the updated settings. `self` is untouched, so a rejected update
    /// leaves the current configuration in place.
    pub fn merged(&self, update: UpdateSettings) -> Result<Self, ConfigError> {
        let mut next = self.clone();

        if let Some(algorithm) = update.algorithm {
            next.algorithm = algorithm;
        }

        if let Some(partial) = update.safe_mode_constraints {
            let mut current = serde_json::to_value(&self.safe_mode_constraints)
                .map_err(|e| ConfigError::InvalidConstraints(e.to_string()))?;
            if let Some(fields) = current.as_object_mut() {
                fields.extend(partial);
            }
            let constraints: SafeModeConstraints = serde_json::from_value(current)
                .map_err(|e| ConfigError::InvalidConstraints(e.to_string()))?;
            constraints
                .validate()
                .map_err(|e| ConfigError::InvalidConstraints(e.to_string()))?;
            next.safe_mode_constraints = constraints;
        }

        if let Some(profiles) = update.analyst_profiles {
            for (id, profile) in profiles {
                if id.trim().is_empty() {
                    return Err(ConfigError::InvalidProfile { id, reason: "empty analyst id".to_string() });
                }
                if let Err(e) = profile.validate() {
                    return Err(ConfigError::InvalidProfile { id, reason: e.to_string() });
                }
                next.analyst_profiles.insert(id, profile);
            }
        }

        Ok(next)
    }

    /// Roster with configured profile overrides applied
    pub fn resolve_roster(&self, analysts: Vec<Analyst>) -> Vec<Analyst> {
        analysts
            .into_iter()
            .map(|mut analyst| {
                if let Some(profile) = self.analyst_profiles.get(&analyst.id) {
                    profile.apply(&mut analyst);
                }
                analyst
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> UpdateSettings {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_partial_constraint_update_keeps_other_fields() {
        let settings = EngineSettings::default();
        let next = settings
            .merged(update(json!({ "safeModeConstraints": { "maxCommittedMinutes": 360 } })))
            .unwrap();

        assert_eq!(next.safe_mode_constraints.max_committed_minutes, 360);
        assert_eq!(next.safe_mode_constraints.max_critical_alerts_per_analyst_per_hour, 10);
        assert_eq!(next.algorithm, Algorithm::AiOptimized);
    }

    #[test]
    fn test_invalid_constraints_rejected() {
        let settings = EngineSettings::default();
        let err = settings
            .merged(update(json!({ "safeModeConstraints": { "maxAlertsPerAnalystPerHour": 0 } })))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstraints(_)));

        let err = settings
            .merged(update(json!({ "safeModeConstraints": { "maxCommittedMinutes": "lots" } })))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstraints(_)));

        let err = settings
            .merged(update(json!({ "safeModeConstraints": { "noSuchLimit": 3 } })))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstraints(_)));
    }

    #[test]
    fn test_algorithm_only_update() {
        let next = EngineSettings::default()
            .merged(update(json!({ "algorithm": "LeastLoaded" })))
            .unwrap();
        assert_eq!(next.algorithm, Algorithm::LeastLoaded);
        assert_eq!(next.safe_mode_constraints, SafeModeConstraints::default());
    }

    #[test]
    fn test_profiles_override_roster() {
        let settings = EngineSettings::default()
            .merged(update(json!({
                "analystProfiles": {
                    "a1": { "specializations": ["APT"], "fatigueResistance": 0.4, "tier": "SENIOR" }
                }
            })))
            .unwrap();

        let roster = settings.resolve_roster(vec![Analyst::new("a1"), Analyst::new("a2")]);
        assert!(roster[0].has_specialization("APT"));
        assert_eq!(roster[0].fatigue_resistance, 0.4);
        assert_eq!(roster[0].tier, RoleTier::Senior);
        assert!(roster[1].specializations.is_empty());
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let err = EngineSettings::default()
            .merged(update(json!({ "analystProfiles": { "a1": { "fatigueResistance": 3.0 } } })))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProfile { .. }));
    }
}
