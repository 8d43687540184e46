//! Batch Assignment Algorithm
//!
//! Greedy single pass over the urgency-ordered batch. Each incident goes to
//! the best-scoring eligible analyst given the workload *after* every earlier
//! assignment in the same batch. Not globally optimal: the pass trades
//! optimality for determinism and O(incidents x analysts) cost.


use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classifier::classify_batch;
use super::compliance::{self, Violation, WindowLedger};
use super::health;
use super::rules::{SafeModeConstraints, ScoringProfile};
use super::scorer::{self, ScoringContext};
use super::types::{
    Analyst, Assignment, BalancingResult, ClassifiedIncident, Incident, RecentAssignment,
    UnassignedThreat, WorkloadSnapshot,
};

/// Default SAFE MODE rolling window
pub const DEFAULT_TIME_WINDOW_MINUTES: u32 = 60;

// ============================================================================
// ALGORITHM SELECTION
// ============================================================================

/// Assignment strategy. All variants run the same pipeline with a different
/// scoring profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[serde(alias = "RoundRobin", alias = "round-robin")]
    RoundRobin,
    #[serde(alias = "LeastLoaded", alias = "least-loaded")]
    LeastLoaded,
    #[serde(alias = "SpecializationBased", alias = "specialization-based")]
    SpecializationBased,
    #[default]
    #[serde(alias = "AIOptimized", alias = "ai-optimized")]
    AiOptimized,
}

impl Algorithm {
    pub fn profile(&self) -> ScoringProfile {
        match self {
            Algorithm::RoundRobin => ScoringProfile::ROUND_ROBIN,
            Algorithm::LeastLoaded => ScoringProfile::LEAST_LOADED,
            Algorithm::SpecializationBased => ScoringProfile::SPECIALIZATION_BASED,
            Algorithm::AiOptimized => ScoringProfile::AI_OPTIMIZED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "round_robin",
            Algorithm::LeastLoaded => "least_loaded",
            Algorithm::SpecializationBased => "specialization_based",
            Algorithm::AiOptimized => "ai_optimized",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// PASS INPUT / OUTPUT
// ============================================================================

#[derive(Debug, Clone)]
pub struct PassOptions {
    pub algorithm: Algorithm,
    pub safe_mode: bool,
    pub time_window_minutes: u32,
    pub constraints: SafeModeConstraints,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            safe_mode: true,
            time_window_minutes: DEFAULT_TIME_WINDOW_MINUTES,
            constraints: SafeModeConstraints::default(),
        }
    }
}

/// Everything a successful pass produces. The caller commits it as a unit.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub result: BalancingResult,
    /// Roster workload after the pass
    pub snapshot: WorkloadSnapshot,
}

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("balancing invariant violated: {0}")]
    InvariantViolation(String),

    #[error("balancing pass exceeded {0}s")]
    Timeout(u64),

    #[error("balancing worker failed: {0}")]
    WorkerFailed(String),
}

// ============================================================================
// MAIN PASS
// ============================================================================

/// Run one balancing pass. `snapshot` and `history` are read, never modified.
pub fn run_pass(
    threats: &[Incident],
    analysts: &[Analyst],
    snapshot: &WorkloadSnapshot,
    history: &[RecentAssignment],
    options: &PassOptions,
    now: DateTime<Utc>,
) -> Result<PassOutcome, EngineError> {
    let classified = classify_batch(threats, now);

    let mut roster: Vec<&Analyst> = analysts.iter().collect();
    roster.sort_by(|a, b| a.id.cmp(&b.id));

    let mut working = snapshot.restricted_to(roster.iter().map(|a| a.id.as_str()));
    let mut ledger = WindowLedger::from_history(history, now, options.time_window_minutes);
    let profile = options.algorithm.profile();

    let mut assignments = Vec::new();
    let mut unassigned = Vec::new();

    for incident in &classified {
        match select_analyst(incident, &roster, &working, &ledger, options, &profile) {
            Selection::Chosen { analyst, score } => {
                let queued_before = working.minutes(&analyst.id);
                working.commit(&analyst.id, incident.estimated_minutes);
                ledger.record(&analyst.id, incident.priority);

                assignments.push(Assignment {
                    threat_id: incident.id().to_string(),
                    analyst_id: analyst.id.clone(),
                    analyst_name: analyst.display_name().to_string(),
                    priority: incident.priority,
                    score,
                    estimated_minutes: incident.estimated_minutes,
                    reason: format!(
                        "{} match: score {}, {} min already queued",
                        options.algorithm, score, queued_before
                    ),
                    assigned_at: now,
                    estimated_completion: now + Duration::minutes(incident.estimated_minutes as i64),
                    safe_mode_evaluated: options.safe_mode,
                });
            }
            Selection::Unplaced { reason } => {
                if incident.priority.is_critical() {
                    tracing::warn!("Critical threat {} left unassigned: {}", incident.id(), reason);
                }
                unassigned.push(UnassignedThreat {
                    threat_id: incident.id().to_string(),
                    priority: incident.priority,
                    urgency: incident.urgency,
                    reason,
                });
            }
        }
    }

    if assignments.len() + unassigned.len() != threats.len() {
        return Err(EngineError::InvariantViolation(format!(
            "{} assigned + {} unassigned != {} threats",
            assignments.len(),
            unassigned.len(),
            threats.len()
        )));
    }

    let report = health::analyze(&assignments, &unassigned, &working, threats.len(), now);

    tracing::debug!(
        "Pass complete: {}/{} assigned via {} (safe mode: {})",
        assignments.len(),
        threats.len(),
        options.algorithm,
        options.safe_mode
    );

    Ok(PassOutcome {
        result: BalancingResult {
            total_threats: threats.len(),
            assigned_threats: assignments.len(),
            unassigned_threats: unassigned.len(),
            algorithm: options.algorithm,
            safe_mode: options.safe_mode,
            assignments,
            unassigned,
            recommendations: report.recommendations,
            system_health: report.health,
            generated_at: now,
            next_balancing_due: report.next_balancing_due,
        },
        snapshot: working,
    })
}

// ============================================================================
// SELECTION
// ============================================================================

enum Selection<'a> {
    Chosen { analyst: &'a Analyst, score: u8 },
    Unplaced { reason: String },
}

/// Highest score wins; equal scores go to the smallest analyst id.
/// `roster` is sorted by id, so keeping the first best is enough.
fn select_analyst<'a>(
    incident: &ClassifiedIncident,
    roster: &[&'a Analyst],
    working: &WorkloadSnapshot,
    ledger: &WindowLedger,
    options: &PassOptions,
    profile: &ScoringProfile,
) -> Selection<'a> {
    if roster.is_empty() {
        return Selection::Unplaced { reason: "No analysts available".to_string() };
    }

    let ctx = ScoringContext { mean_minutes: working.mean(), profile: *profile };
    let mut best: Option<(&'a Analyst, u8)> = None;
    let mut blocked: Vec<(&str, Violation)> = Vec::new();

    for analyst in roster {
        if options.safe_mode {
            if let Err(violation) = compliance::check(analyst, incident, working, ledger, &options.constraints) {
                blocked.push((&analyst.id, violation));
                continue;
            }
        }

        let score = scorer::score(
            incident,
            analyst,
            working.minutes(&analyst.id),
            ledger.alerts(&analyst.id),
            profile.consider_fatigue,
            &ctx,
        );

        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((analyst, score));
        }
    }

    match best {
        Some((analyst, score)) => Selection::Chosen { analyst, score },
        None => {
            let detail = blocked
                .first()
                .map(|(id, v)| format!("; {}: {}", id, v))
                .unwrap_or_default();
            Selection::Unplaced {
                reason: format!("All {} analysts blocked by SAFE MODE{}", blocked.len(), detail),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
