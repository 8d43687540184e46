//! Engine Types
//!
//! Core data structures for incidents, analysts, workload and results.
//! No balancing logic lives here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// PRIORITY
// ============================================================================

/// Incident priority band (ordered: Low < Medium < High < Critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Parse a free-text severity. `info` maps to Low.
    pub fn from_severity(severity: &str) -> Option<Self> {
        match severity.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" | "moderate" => Some(Priority::Medium),
            "low" | "info" | "informational" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    pub fn is_critical(&self) -> bool {
        *self == Priority::Critical
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// INCIDENTS
// ============================================================================

/// Raw incident as delivered by the ingestion feed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    #[validate(length(min = 1, message = "incident id must not be empty"))]
    pub id: String,

    /// Free text, usually critical|high|medium|low|info
    #[serde(default)]
    pub severity: Option<String>,

    /// Missing timestamps are treated as "just detected"
    #[serde(default, alias = "timestamp")]
    pub detected_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub affected_systems: u32,

    #[serde(default, alias = "type")]
    pub category: String,

    #[serde(default)]
    pub correlated_incidents: u32,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "aiConfidence must be within 0-100"))]
    pub ai_confidence: f64,

    #[serde(default)]
    pub indicators: Vec<String>,
}

/// Incident with every field the balancer needs, derived once per pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedIncident {
    #[serde(flatten)]
    pub incident: Incident,
    pub priority: Priority,
    pub complexity: u8,
    pub estimated_minutes: u32,
    pub required_specializations: BTreeSet<String>,
    pub urgency: f64,
    pub resource_intensity: u8,
}

impl ClassifiedIncident {
    pub fn id(&self) -> &str {
        &self.incident.id
    }
}

// ============================================================================
// ANALYSTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTier {
    Senior,
    #[default]
    Mid,
    Junior,
}

/// A human responder. The roster is owned by the directory service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Analyst {
    #[validate(length(min = 1, message = "analyst id must not be empty"))]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "role")]
    pub tier: RoleTier,

    #[serde(default)]
    pub specializations: BTreeSet<String>,

    /// Max committed minutes per priority band
    #[serde(default)]
    pub capacity: BTreeMap<Priority, u32>,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0, message = "fatigueResistance must be within 0-1"))]
    pub fatigue_resistance: f64,
}

impl Analyst {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tier: RoleTier::default(),
            specializations: BTreeSet::new(),
            capacity: BTreeMap::new(),
            fatigue_resistance: 0.0,
        }
    }

    pub fn has_specialization(&self, tag: &str) -> bool {
        self.specializations.iter().any(|s| s.eq_ignore_ascii_case(tag))
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

// ============================================================================
// WORKLOAD
// ============================================================================

/// Committed minutes per analyst within the active window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadSnapshot(BTreeMap<String, u32>);

impl WorkloadSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minutes(&self, analyst_id: &str) -> u32 {
        self.0.get(analyst_id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, analyst_id: impl Into<String>, minutes: u32) {
        self.0.insert(analyst_id.into(), minutes);
    }

    /// Add committed minutes, returning the new total
    pub fn commit(&mut self, analyst_id: &str, minutes: u32) -> u32 {
        let entry = self.0.entry(analyst_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(minutes);
        *entry
    }

    /// Release minutes for finished work (never below zero)
    pub fn release(&mut self, analyst_id: &str, minutes: u32) {
        if let Some(entry) = self.0.get_mut(analyst_id) {
            *entry = entry.saturating_sub(minutes);
        }
    }

    /// Copy holding exactly the given analysts (missing ones at zero)
    pub fn restricted_to<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self(ids.into_iter().map(|id| (id.to_string(), self.minutes(id))).collect())
    }

    /// Overlay another snapshot's entries on top of this one
    pub fn merge(&mut self, other: &WorkloadSnapshot) {
        for (id, minutes) in other.iter() {
            self.0.insert(id.to_string(), minutes);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(id, m)| (id.as_str(), *m))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.values().map(|m| *m as f64).sum::<f64>() / self.0.len() as f64
    }

    pub fn max(&self) -> u32 {
        self.0.values().copied().max().unwrap_or(0)
    }

    pub fn min(&self) -> u32 {
        self.0.values().copied().min().unwrap_or(0)
    }
}

impl FromIterator<(String, u32)> for WorkloadSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An assignment already made inside the SAFE MODE window (previous passes or
/// supplied by the caller)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAssignment {
    pub analyst_id: String,
    #[serde(default)]
    pub threat_id: String,
    pub priority: Priority,
    pub assigned_at: DateTime<Utc>,
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub threat_id: String,
    pub analyst_id: String,
    pub analyst_name: String,
    pub priority: Priority,
    pub score: u8,
    pub estimated_minutes: u32,
    pub reason: String,
    pub assigned_at: DateTime<Utc>,
    pub estimated_completion: DateTime<Utc>,
    pub safe_mode_evaluated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedThreat {
    pub threat_id: String,
    pub priority: Priority,
    pub urgency: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Unbalanced,
    Critical,
    Overloaded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub assignment_rate: f64,
    pub load_imbalance: f64,
    pub average_workload_minutes: f64,
    pub max_workload_minutes: u32,
    pub min_workload_minutes: u32,
    pub unassigned_critical: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    OverloadPrevention,
    CriticalThreatCoverage,
    FatiguePrevention,
    NoActionRequired,
    SystemError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeModeRecommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub message: String,
    pub action: String,
    #[serde(default)]
    pub affected_analysts: Vec<String>,
    #[serde(default)]
    pub affected_threats: Vec<String>,
}

/// Outcome of one balancing pass. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancingResult {
    pub total_threats: usize,
    pub assigned_threats: usize,
    pub unassigned_threats: usize,
    pub algorithm: super::Algorithm,
    pub safe_mode: bool,
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<UnassignedThreat>,
    pub recommendations: Vec<SafeModeRecommendation>,
    pub system_health: SystemHealth,
    pub generated_at: DateTime<Utc>,
    pub next_balancing_due: DateTime<Utc>,
}
