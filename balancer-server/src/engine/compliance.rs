//! Safe-Mode Compliance Checker
//!
//! Decides whether an analyst may take one more incident without breaking a
//! SAFE MODE constraint. Checks run against the workload as it stands at that
//! moment in the batch, not the pre-batch state.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::rules::SafeModeConstraints;
use super::types::{Analyst, ClassifiedIncident, Priority, RecentAssignment, WorkloadSnapshot};

/// Why an analyst was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("alert limit reached ({count}/{limit} in window)")]
    AlertLimit { count: u32, limit: u32 },

    #[error("critical alert limit reached ({count}/{limit} in window)")]
    CriticalLimit { count: u32, limit: u32 },

    #[error("workload ceiling exceeded ({minutes}/{limit} min)")]
    WorkloadCeiling { minutes: u32, limit: u32 },

    #[error("{priority} capacity exceeded ({projected}/{capacity} min)")]
    CapacityExceeded { priority: Priority, projected: u32, capacity: u32 },
}

// ============================================================================
// WINDOW LEDGER
// ============================================================================

/// Alert counts per analyst inside the rolling SAFE MODE window.
/// Seeded from history, then updated as the batch assigns.
#[derive(Debug, Clone, Default)]
pub struct WindowLedger {
    alerts: HashMap<String, u32>,
    critical: HashMap<String, u32>,
}

impl WindowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every assignment made at or after `now - window_minutes`
    pub fn from_history(history: &[RecentAssignment], now: DateTime<Utc>, window_minutes: u32) -> Self {
        let window_start = now - Duration::minutes(window_minutes as i64);
        let mut ledger = Self::new();
        for entry in history.iter().filter(|e| e.assigned_at >= window_start) {
            ledger.record(&entry.analyst_id, entry.priority);
        }
        ledger
    }

    pub fn record(&mut self, analyst_id: &str, priority: Priority) {
        *self.alerts.entry(analyst_id.to_string()).or_insert(0) += 1;
        if priority.is_critical() {
            *self.critical.entry(analyst_id.to_string()).or_insert(0) += 1;
        }
    }

    pub fn alerts(&self, analyst_id: &str) -> u32 {
        self.alerts.get(analyst_id).copied().unwrap_or(0)
    }

    pub fn critical_alerts(&self, analyst_id: &str) -> u32 {
        self.critical.get(analyst_id).copied().unwrap_or(0)
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Run every SAFE MODE check, returning the first violation
pub fn check(
    analyst: &Analyst,
    incident: &ClassifiedIncident,
    snapshot: &WorkloadSnapshot,
    ledger: &WindowLedger,
    constraints: &SafeModeConstraints,
) -> Result<(), Violation> {
    let alerts = ledger.alerts(&analyst.id);
    if alerts >= constraints.max_alerts_per_analyst_per_hour {
        return Err(Violation::AlertLimit {
            count: alerts,
            limit: constraints.max_alerts_per_analyst_per_hour,
        });
    }

    if incident.priority.is_critical() {
        let critical = ledger.critical_alerts(&analyst.id);
        if critical >= constraints.max_critical_alerts_per_analyst_per_hour {
            return Err(Violation::CriticalLimit {
                count: critical,
                limit: constraints.max_critical_alerts_per_analyst_per_hour,
            });
        }
    }

    let minutes = snapshot.minutes(&analyst.id);
    if minutes > constraints.max_committed_minutes {
        return Err(Violation::WorkloadCeiling {
            minutes,
            limit: constraints.max_committed_minutes,
        });
    }

    if let Some(&capacity) = analyst.capacity.get(&incident.priority) {
        let projected = minutes.saturating_add(incident.estimated_minutes);
        if projected > capacity {
            return Err(Violation::CapacityExceeded {
                priority: incident.priority,
                projected,
                capacity,
            });
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
