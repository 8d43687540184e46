//! Health & Recommendation Analyzer
//!
//! Derives system health and SAFE MODE recommendations from a finished pass.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::balancer::PassOptions;
use super::classifier::{derive_priority, urgency};
use super::rules::{
    FATIGUE_WARNING_MINUTES, MAX_BALANCED_IMBALANCE, MIN_HEALTHY_ASSIGNMENT_RATE,
    OVERLOAD_WARNING_MINUTES, SHIFT_MINUTES,
};
use super::types::{
    Assignment, BalancingResult, HealthStatus, Incident, Priority, RecommendationType,
    SafeModeRecommendation, SystemHealth, UnassignedThreat, WorkloadSnapshot,
};

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub health: SystemHealth,
    pub recommendations: Vec<SafeModeRecommendation>,
    pub next_balancing_due: DateTime<Utc>,
}

/// Analyze a finished batch. `snapshot` is the roster workload after the pass.
pub fn analyze(
    assignments: &[Assignment],
    unassigned: &[UnassignedThreat],
    snapshot: &WorkloadSnapshot,
    total_threats: usize,
    now: DateTime<Utc>,
) -> HealthReport {
    let rate = assignment_rate(assignments.len(), total_threats);
    let imbalance = load_imbalance(snapshot);
    let unassigned_critical = unassigned.iter().filter(|u| u.priority.is_critical()).count();

    HealthReport {
        health: SystemHealth {
            status: health_status(rate, imbalance, unassigned_critical, total_threats),
            assignment_rate: rate,
            load_imbalance: imbalance,
            average_workload_minutes: snapshot.mean(),
            max_workload_minutes: snapshot.max(),
            min_workload_minutes: snapshot.min(),
            unassigned_critical,
        },
        recommendations: recommendations(snapshot, unassigned),
        next_balancing_due: next_balancing_due(imbalance, now),
    }
}

/// Percentage of threats placed (0 for an empty batch)
pub fn assignment_rate(assigned: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    assigned as f64 * 100.0 / total as f64
}

/// Spread between busiest and idlest analyst, relative to the mean (%)
pub fn load_imbalance(snapshot: &WorkloadSnapshot) -> f64 {
    let mean = snapshot.mean();
    if mean <= 0.0 {
        return 0.0;
    }
    (snapshot.max() - snapshot.min()) as f64 * 100.0 / mean
}

/// First matching condition wins: OVERLOADED, UNBALANCED, CRITICAL, HEALTHY.
/// An empty batch has no assignment rate to judge, so it skips OVERLOADED.
pub fn health_status(rate: f64, imbalance: f64, unassigned_critical: usize, total: usize) -> HealthStatus {
    if total > 0 && rate < MIN_HEALTHY_ASSIGNMENT_RATE {
        HealthStatus::Overloaded
    } else if imbalance > MAX_BALANCED_IMBALANCE {
        HealthStatus::Unbalanced
    } else if unassigned_critical > 0 {
        HealthStatus::Critical
    } else {
        HealthStatus::Healthy
    }
}

pub fn recommendations(snapshot: &WorkloadSnapshot, unassigned: &[UnassignedThreat]) -> Vec<SafeModeRecommendation> {
    let mut out = Vec::new();

    let overloaded = analysts_above(snapshot, OVERLOAD_WARNING_MINUTES);
    if !overloaded.is_empty() {
        out.push(SafeModeRecommendation {
            kind: RecommendationType::OverloadPrevention,
            priority: Priority::High,
            message: format!(
                "{} analyst(s) above {} committed minutes",
                overloaded.len(),
                OVERLOAD_WARNING_MINUTES
            ),
            action: "Redistribute queued work or bring additional analysts on shift".to_string(),
            affected_analysts: overloaded,
            affected_threats: vec![],
        });
    }

    let critical: Vec<String> = unassigned
        .iter()
        .filter(|u| u.priority.is_critical())
        .map(|u| u.threat_id.clone())
        .collect();
    if !critical.is_empty() {
        out.push(SafeModeRecommendation {
            kind: RecommendationType::CriticalThreatCoverage,
            priority: Priority::Critical,
            message: format!("{} critical threat(s) could not be assigned", critical.len()),
            action: "Escalate to on-call lead for manual assignment".to_string(),
            affected_analysts: vec![],
            affected_threats: critical,
        });
    }

    let fatigued = analysts_above(snapshot, FATIGUE_WARNING_MINUTES);
    if !fatigued.is_empty() {
        out.push(SafeModeRecommendation {
            kind: RecommendationType::FatiguePrevention,
            priority: Priority::High,
            message: format!(
                "{} analyst(s) above {} committed minutes, burnout risk",
                fatigued.len(),
                FATIGUE_WARNING_MINUTES
            ),
            action: "Schedule a mandatory break before new assignments".to_string(),
            affected_analysts: fatigued,
            affected_threats: vec![],
        });
    }

    if out.is_empty() {
        out.push(SafeModeRecommendation {
            kind: RecommendationType::NoActionRequired,
            priority: Priority::Low,
            message: "Workload within SAFE MODE limits".to_string(),
            action: "None".to_string(),
            affected_analysts: vec![],
            affected_threats: vec![],
        });
    }

    out
}

fn analysts_above(snapshot: &WorkloadSnapshot, minutes: u32) -> Vec<String> {
    snapshot
        .iter()
        .filter(|(_, m)| *m > minutes)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Rebalance sooner the more uneven the load is
pub fn next_balancing_due(imbalance: f64, now: DateTime<Utc>) -> DateTime<Utc> {
    let minutes = if imbalance > 75.0 {
        15
    } else if imbalance > 50.0 {
        30
    } else if imbalance > 25.0 {
        60
    } else {
        120
    };
    now + Duration::minutes(minutes)
}

// ============================================================================
// FALLBACK
// ============================================================================

/// Safe result returned when a pass fails: nothing assigned, every threat
/// listed as unassigned, and a CRITICAL instruction to assign manually.
pub fn fallback_result(
    threats: &[Incident],
    options: &PassOptions,
    now: DateTime<Utc>,
    error: &str,
) -> BalancingResult {
    let unassigned: Vec<UnassignedThreat> = threats
        .iter()
        .map(|t| {
            let priority = derive_priority(t);
            UnassignedThreat {
                threat_id: t.id.clone(),
                priority,
                urgency: urgency(priority, t.detected_at, now),
                reason: "Balancing engine failure".to_string(),
            }
        })
        .collect();

    BalancingResult {
        total_threats: threats.len(),
        assigned_threats: 0,
        unassigned_threats: unassigned.len(),
        algorithm: options.algorithm,
        safe_mode: options.safe_mode,
        recommendations: vec![SafeModeRecommendation {
            kind: RecommendationType::SystemError,
            priority: Priority::Critical,
            message: format!("Automatic balancing failed: {}", error),
            action: "Assign all pending threats manually until balancing recovers".to_string(),
            affected_analysts: vec![],
            affected_threats: unassigned.iter().map(|u| u.threat_id.clone()).collect(),
        }],
        system_health: SystemHealth {
            status: HealthStatus::Critical,
            assignment_rate: 0.0,
            load_imbalance: 0.0,
            average_workload_minutes: 0.0,
            max_workload_minutes: 0,
            min_workload_minutes: 0,
            unassigned_critical: unassigned.iter().filter(|u| u.priority.is_critical()).count(),
        },
        unassigned,
        assignments: vec![],
        generated_at: now,
        next_balancing_due: now + Duration::minutes(15),
    }
}

// ============================================================================
// UTILIZATION
// ============================================================================

/// Analyst load label for status views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkloadLabel {
    Available,
    Active,
    Busy,
    Overloaded,
}

/// Share of a shift already committed, capped at 100
pub fn utilization(minutes: u32) -> f64 {
    (minutes as f64 / SHIFT_MINUTES * 100.0).min(100.0)
}

pub fn workload_label(utilization: f64) -> WorkloadLabel {
    if utilization < 50.0 {
        WorkloadLabel::Available
    } else if utilization < 75.0 {
        WorkloadLabel::Active
    } else if utilization < 90.0 {
        WorkloadLabel::Busy
    } else {
        WorkloadLabel::Overloaded
    }
}

// ============================================================================
// TESTS
// ============================================================================
