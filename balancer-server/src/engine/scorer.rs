//! Assignment Scorer
//!
//! Suitability of one analyst for one incident, 0-100.
//! Specialization and fatigue are read from the analyst actually being scored.

use super::rules::{
    ScoringProfile, BASE_FATIGUE, CRITICAL_FATIGUE, GENERAL_SPECIALIZATION, SHIFT_MINUTES, STANDARD_FATIGUE,
};
use super::types::{Analyst, ClassifiedIncident};

/// Roster-wide inputs that do not depend on the analyst being scored
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext {
    /// Mean committed minutes across the roster, at this point of the batch
    pub mean_minutes: f64,
    pub profile: ScoringProfile,
}

/// Per-component values, each in 0.0-1.0 except `urgency_bonus` (points)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub specialization: f64,
    pub workload: f64,
    pub fatigue: f64,
    pub headroom: f64,
    pub rotation: f64,
    pub urgency_bonus: f64,
    pub total: u8,
}

/// Integer score, 0-100
pub fn score(
    incident: &ClassifiedIncident,
    analyst: &Analyst,
    current_minutes: u32,
    window_assignments: u32,
    consider_fatigue: bool,
    ctx: &ScoringContext,
) -> u8 {
    breakdown(incident, analyst, current_minutes, window_assignments, consider_fatigue, ctx).total
}

pub fn breakdown(
    incident: &ClassifiedIncident,
    analyst: &Analyst,
    current_minutes: u32,
    window_assignments: u32,
    consider_fatigue: bool,
    ctx: &ScoringContext,
) -> ScoreBreakdown {
    let p = &ctx.profile;

    let specialization = specialization_match(incident, analyst);
    let workload = workload_balance(current_minutes, ctx.mean_minutes);
    let fatigue = if consider_fatigue { fatigue_headroom(incident, analyst) } else { 0.0 };
    let headroom = (1.0 - current_minutes as f64 / SHIFT_MINUTES).max(0.0);
    // assignments inside the SAFE MODE window, earlier passes included
    let rotation = 1.0 / (1.0 + window_assignments as f64);
    let urgency_bonus = (incident.urgency / 10.0).min(p.urgency_cap).max(0.0);

    let raw = p.specialization_weight * specialization
        + p.workload_weight * workload
        + p.fatigue_weight * fatigue
        + p.headroom_weight * headroom
        + p.rotation_weight * rotation
        + urgency_bonus;

    ScoreBreakdown {
        specialization,
        workload,
        fatigue,
        headroom,
        rotation,
        urgency_bonus,
        total: raw.round().clamp(0.0, 100.0) as u8,
    }
}

/// Fraction of required tags the analyst holds; General needs nothing
pub fn specialization_match(incident: &ClassifiedIncident, analyst: &Analyst) -> f64 {
    let required: Vec<&String> = incident
        .required_specializations
        .iter()
        .filter(|tag| !tag.eq_ignore_ascii_case(GENERAL_SPECIALIZATION))
        .collect();

    if required.is_empty() {
        return 1.0;
    }

    let matched = required.iter().filter(|tag| analyst.has_specialization(tag)).count();
    matched as f64 / required.len() as f64
}

/// 1 at the roster mean, falling linearly with distance from it
pub fn workload_balance(current_minutes: u32, mean_minutes: f64) -> f64 {
    if mean_minutes <= 0.0 {
        return 1.0;
    }
    (1.0 - (current_minutes as f64 - mean_minutes).abs() / mean_minutes).max(0.0)
}

/// Remaining headroom after expected fatigue; resistance 0 gives 1 - (0.3 + priorityFatigue)
pub fn fatigue_headroom(incident: &ClassifiedIncident, analyst: &Analyst) -> f64 {
    let priority_fatigue = if incident.priority.is_critical() { CRITICAL_FATIGUE } else { STANDARD_FATIGUE };
    let resistance = analyst.fatigue_resistance.clamp(0.0, 1.0);
    (1.0 - (BASE_FATIGUE + priority_fatigue) * (1.0 - resistance)).max(0.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::classify;
    use crate::engine::types::Incident;
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn classified(severity: &str, category: &str) -> ClassifiedIncident {
        classify(
            &Incident {
                id: "t-1".to_string(),
                severity: Some(severity.to_string()),
                detected_at: Some(now()),
                affected_systems: 1,
                category: category.to_string(),
                correlated_incidents: 0,
                ai_confidence: 0.0,
                indicators: vec![],
            },
            now(),
        )
    }

    fn ai_ctx(mean: f64) -> ScoringContext {
        ScoringContext { mean_minutes: mean, profile: ScoringProfile::AI_OPTIMIZED }
    }

    #[test]
    fn test_general_incident_full_specialization() {
        let incident = classified("high", "misc");
        assert_eq!(specialization_match(&incident, &Analyst::new("a1")), 1.0);
    }

    #[test]
    fn test_specialization_uses_actual_analyst() {
        let incident = classified("high", "phishing malware");
        let mut expert = Analyst::new("expert");
        expert.specializations.insert("phishing".to_string());
        let novice = Analyst::new("novice");

        assert_eq!(specialization_match(&incident, &expert), 0.5);
        assert_eq!(specialization_match(&incident, &novice), 0.0);
    }

    #[test]
    fn test_workload_balance() {
        assert_eq!(workload_balance(100, 0.0), 1.0);
        assert_eq!(workload_balance(100, 100.0), 1.0);
        assert_eq!(workload_balance(150, 100.0), 0.5);
        assert_eq!(workload_balance(300, 100.0), 0.0);
    }

    #[test]
    fn test_fatigue_headroom() {
        let critical = classified("critical", "");
        let low = classified("low", "");
        let analyst = Analyst::new("a1");
        assert!((fatigue_headroom(&critical, &analyst) - 0.5).abs() < 1e-9);
        assert!((fatigue_headroom(&low, &analyst) - 0.6).abs() < 1e-9);

        let mut resilient = Analyst::new("a2");
        resilient.fatigue_resistance = 1.0;
        assert_eq!(fatigue_headroom(&critical, &resilient), 1.0);
    }

    #[test]
    fn test_ai_optimized_score() {
        // critical, fresh: 40 + 30 + 20*0.5 + 10 = 90
        let incident = classified("critical", "");
        let s = score(&incident, &Analyst::new("a1"), 0, 0, true, &ai_ctx(0.0));
        assert_eq!(s, 90);

        // without fatigue: 40 + 30 + 10 = 80
        let s = score(&incident, &Analyst::new("a1"), 0, 0, false, &ai_ctx(0.0));
        assert_eq!(s, 80);
    }

    #[test]
    fn test_urgency_bonus_scales() {
        // medium fresh incident: urgency 50 -> 5 bonus
        let incident = classified("medium", "");
        let b = breakdown(&incident, &Analyst::new("a1"), 0, 0, true, &ai_ctx(0.0));
        assert_eq!(b.urgency_bonus, 5.0);
        // 40 + 30 + 12 + 5
        assert_eq!(b.total, 87);
    }

    #[test]
    fn test_round_robin_prefers_fewer_window_assignments() {
        let incident = classified("medium", "");
        let ctx = ScoringContext { mean_minutes: 0.0, profile: ScoringProfile::ROUND_ROBIN };
        let fresh = score(&incident, &Analyst::new("a1"), 0, 0, false, &ctx);
        let busy = score(&incident, &Analyst::new("a2"), 0, 1, false, &ctx);
        assert_eq!(fresh, 100);
        assert_eq!(busy, 50);
    }

    #[test]
    fn test_least_loaded_ignores_specialization() {
        let incident = classified("high", "ddos");
        let ctx = ScoringContext { mean_minutes: 120.0, profile: ScoringProfile::LEAST_LOADED };
        assert_eq!(score(&incident, &Analyst::new("idle"), 0, 0, false, &ctx), 100);
        assert_eq!(score(&incident, &Analyst::new("busy"), 240, 0, false, &ctx), 50);
    }
}
