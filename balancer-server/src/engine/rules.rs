//! Balancing Rules & Thresholds
//!
//! Constants, SAFE MODE constraints and scoring profiles.
//! No assignment logic here.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::types::Priority;

// ============================================================================
// CLASSIFICATION CONSTANTS
// ============================================================================

/// Base handling time for a complexity-1 incident
pub const BASE_HANDLING_MINUTES: f64 = 15.0;

/// Urgency from age is capped at this many points
pub const MAX_AGE_URGENCY: f64 = 50.0;

/// Urgency points gained per minute since detection
pub const AGE_URGENCY_PER_MINUTE: f64 = 2.0;

pub const MAX_COMPLEXITY: u8 = 5;
pub const MAX_RESOURCE_INTENSITY: u8 = 10;

/// Tag used when no known category matches
pub const GENERAL_SPECIALIZATION: &str = "General";

pub fn priority_multiplier(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 2.0,
        Priority::High => 1.5,
        Priority::Medium => 1.0,
        Priority::Low => 0.8,
    }
}

pub fn priority_weight(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 100.0,
        Priority::High => 75.0,
        Priority::Medium => 50.0,
        Priority::Low => 25.0,
    }
}

// ============================================================================
// SCORING CONSTANTS
// ============================================================================

pub const BASE_FATIGUE: f64 = 0.3;
pub const CRITICAL_FATIGUE: f64 = 0.2;
pub const STANDARD_FATIGUE: f64 = 0.1;

/// Urgency bonus never exceeds this many points
pub const MAX_URGENCY_BONUS: f64 = 10.0;

// ============================================================================
// HEALTH THRESHOLDS
// ============================================================================

/// Below this assignment rate (%) the system is OVERLOADED
pub const MIN_HEALTHY_ASSIGNMENT_RATE: f64 = 80.0;

/// Above this load imbalance (%) the system is UNBALANCED
pub const MAX_BALANCED_IMBALANCE: f64 = 50.0;

/// Committed minutes that trigger OVERLOAD_PREVENTION
pub const OVERLOAD_WARNING_MINUTES: u32 = 240;

/// Committed minutes that trigger FATIGUE_PREVENTION
pub const FATIGUE_WARNING_MINUTES: u32 = 300;

/// A full analyst shift, used for utilization
pub const SHIFT_MINUTES: f64 = 480.0;

// ============================================================================
// SAFE MODE CONSTRAINTS (runtime configurable)
// ============================================================================

/// Hard limits that protect analysts from overload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
#[validate(schema(function = "validate_fatigue_thresholds"))]
pub struct SafeModeConstraints {
    #[validate(range(min = 1, max = 1000))]
    pub max_alerts_per_analyst_per_hour: u32,

    #[validate(range(min = 1, max = 1000))]
    pub max_critical_alerts_per_analyst_per_hour: u32,

    #[validate(range(max = 1440))]
    pub min_rest_minutes_between_critical: u32,

    #[validate(range(min = 1, max = 24))]
    pub max_consecutive_hours_without_break: u32,

    /// Hard ceiling on queued work per analyst
    #[validate(range(min = 1, max = 10080))]
    pub max_committed_minutes: u32,

    #[validate(range(min = 0.0, max = 1.0))]
    pub fatigue_threshold: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub burnout_threshold: f64,
}

impl Default for SafeModeConstraints {
    fn default() -> Self {
        Self {
            max_alerts_per_analyst_per_hour: 20,
            max_critical_alerts_per_analyst_per_hour: 10,
            min_rest_minutes_between_critical: 15,
            max_consecutive_hours_without_break: 4,
            max_committed_minutes: 300,
            fatigue_threshold: 0.7,
            burnout_threshold: 0.85,
        }
    }
}

fn validate_fatigue_thresholds(c: &SafeModeConstraints) -> Result<(), ValidationError> {
    if c.fatigue_threshold > c.burnout_threshold {
        let mut err = ValidationError::new("fatigue_above_burnout");
        err.message = Some("fatigueThreshold must not exceed burnoutThreshold".into());
        return Err(err);
    }
    if c.max_critical_alerts_per_analyst_per_hour > c.max_alerts_per_analyst_per_hour {
        let mut err = ValidationError::new("critical_above_total");
        err.message = Some("maxCriticalAlertsPerAnalystPerHour must not exceed maxAlertsPerAnalystPerHour".into());
        return Err(err);
    }
    Ok(())
}

// ============================================================================
// SCORING PROFILES
// ============================================================================

/// Component weights fed to the scorer. Every algorithm is one of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringProfile {
    pub specialization_weight: f64,
    pub workload_weight: f64,
    pub fatigue_weight: f64,
    /// Favors analysts with the most unqueued shift time
    pub headroom_weight: f64,
    /// Upper bound of the urgency bonus (0 disables it)
    pub urgency_cap: f64,
    /// Favors analysts with fewer assignments in the current batch
    pub rotation_weight: f64,
    pub consider_fatigue: bool,
}

impl ScoringProfile {
    pub const AI_OPTIMIZED: Self = Self {
        specialization_weight: 40.0,
        workload_weight: 30.0,
        fatigue_weight: 20.0,
        headroom_weight: 0.0,
        urgency_cap: MAX_URGENCY_BONUS,
        rotation_weight: 0.0,
        consider_fatigue: true,
    };

    pub const LEAST_LOADED: Self = Self {
        specialization_weight: 0.0,
        workload_weight: 0.0,
        fatigue_weight: 0.0,
        headroom_weight: 100.0,
        urgency_cap: 0.0,
        rotation_weight: 0.0,
        consider_fatigue: false,
    };

    pub const SPECIALIZATION_BASED: Self = Self {
        specialization_weight: 100.0,
        workload_weight: 0.0,
        fatigue_weight: 0.0,
        headroom_weight: 0.0,
        urgency_cap: 0.0,
        rotation_weight: 0.0,
        consider_fatigue: false,
    };

    pub const ROUND_ROBIN: Self = Self {
        specialization_weight: 0.0,
        workload_weight: 0.0,
        fatigue_weight: 0.0,
        headroom_weight: 0.0,
        urgency_cap: 0.0,
        rotation_weight: 100.0,
        consider_fatigue: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_are_valid() {
        let c = SafeModeConstraints::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.max_critical_alerts_per_analyst_per_hour, 10);
        assert_eq!(c.max_committed_minutes, 300);
    }

    #[test]
    fn test_reject_fatigue_above_burnout() {
        let c = SafeModeConstraints {
            fatigue_threshold: 0.9,
            burnout_threshold: 0.5,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_reject_zero_alert_limit() {
        let c = SafeModeConstraints {
            max_alerts_per_analyst_per_hour: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_ai_profile_max_score_within_bounds() {
        let p = ScoringProfile::AI_OPTIMIZED;
        let max = p.specialization_weight + p.workload_weight + p.fatigue_weight + p.urgency_cap;
        assert!(max <= 100.0);
    }
}
