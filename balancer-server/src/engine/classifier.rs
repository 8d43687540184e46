//! Threat Classifier
//!
//! Turns a raw incident into a ClassifiedIncident.
//! Deterministic: same incident + same `now` gives the same output.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::rules::{
    priority_multiplier, priority_weight, AGE_URGENCY_PER_MINUTE, BASE_HANDLING_MINUTES,
    GENERAL_SPECIALIZATION, MAX_AGE_URGENCY, MAX_COMPLEXITY, MAX_RESOURCE_INTENSITY,
};
use super::types::{ClassifiedIncident, Incident, Priority};

/// Known categories and the keywords that select them.
/// Keywords are matched as whole words, or as a prefix followed by digits (`apt29`).
const SPECIALIZATION_KEYWORDS: &[(&str, &[&str])] = &[
    ("APT", &["apt", "nation-state", "advanced persistent threat"]),
    ("Malware", &["malware", "ransomware", "trojan", "virus", "worm", "botnet", "rootkit"]),
    ("Phishing", &["phishing", "phish", "spearphishing", "bec"]),
    ("DDoS", &["ddos", "dos", "denial of service", "flood"]),
    ("ZeroDay", &["zero-day", "zeroday", "zero day", "0day", "0-day"]),
];

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify a single incident
pub fn classify(incident: &Incident, now: DateTime<Utc>) -> ClassifiedIncident {
    let priority = derive_priority(incident);
    let complexity = derive_complexity(incident);
    let estimated_minutes = estimate_minutes(complexity, priority);
    let resource_intensity = ((complexity as f64 * estimated_minutes as f64) / 10.0)
        .round()
        .clamp(1.0, MAX_RESOURCE_INTENSITY as f64) as u8;

    ClassifiedIncident {
        incident: incident.clone(),
        priority,
        complexity,
        estimated_minutes,
        required_specializations: required_specializations(incident),
        urgency: urgency(priority, incident.detected_at, now),
        resource_intensity,
    }
}

/// Classify a batch and order it for assignment: urgency descending,
/// equal urgency keeps input order.
pub fn classify_batch(incidents: &[Incident], now: DateTime<Utc>) -> Vec<ClassifiedIncident> {
    let mut classified: Vec<ClassifiedIncident> =
        incidents.iter().map(|i| classify(i, now)).collect();

    // sort_by is stable
    classified.sort_by(|a, b| b.urgency.total_cmp(&a.urgency));
    classified
}

// ============================================================================
// DERIVED FIELDS
// ============================================================================

/// Severity first, then confidence may only raise it
pub fn derive_priority(incident: &Incident) -> Priority {
    let from_severity = incident
        .severity
        .as_deref()
        .and_then(Priority::from_severity)
        .unwrap_or(Priority::Medium);

    match confidence_priority(incident.ai_confidence) {
        Some(p) if p > from_severity => p,
        _ => from_severity,
    }
}

fn confidence_priority(confidence: f64) -> Option<Priority> {
    if confidence > 90.0 {
        Some(Priority::Critical)
    } else if confidence > 75.0 {
        Some(Priority::High)
    } else if confidence > 60.0 {
        Some(Priority::Medium)
    } else {
        None
    }
}

/// Sum of complexity factors, clamped to 1..=5
pub fn derive_complexity(incident: &Incident) -> u8 {
    let text = label_text(incident);
    let mut points: u32 = 0;

    if incident.affected_systems > 10 {
        points += 2;
    }
    if has_keyword(&text, &["apt", "advanced persistent threat"]) {
        points += 3;
    }
    if has_keyword(&text, &["zero-day", "zeroday", "zero day", "0day", "0-day"]) {
        points += 3;
    }
    if incident.correlated_incidents > 5 {
        points += 2;
    }
    if incident.ai_confidence > 80.0 {
        points += 1;
    }

    points.clamp(1, MAX_COMPLEXITY as u32) as u8
}

pub fn estimate_minutes(complexity: u8, priority: Priority) -> u32 {
    (BASE_HANDLING_MINUTES * complexity as f64 * priority_multiplier(priority)).round() as u32
}

pub fn required_specializations(incident: &Incident) -> BTreeSet<String> {
    let text = label_text(incident);
    let mut tags: BTreeSet<String> = SPECIALIZATION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| has_keyword(&text, keywords))
        .map(|(tag, _)| tag.to_string())
        .collect();

    if tags.is_empty() {
        tags.insert(GENERAL_SPECIALIZATION.to_string());
    }
    tags
}

pub fn urgency(priority: Priority, detected_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let age_minutes = detected_at
        .map(|ts| (now - ts).num_seconds() as f64 / 60.0)
        .unwrap_or(0.0)
        .max(0.0);

    priority_weight(priority) + (age_minutes * AGE_URGENCY_PER_MINUTE).min(MAX_AGE_URGENCY)
}

// ============================================================================
// KEYWORD MATCHING
// ============================================================================

fn label_text(incident: &Incident) -> String {
    let mut text = incident.category.to_lowercase();
    for indicator in &incident.indicators {
        text.push(' ');
        text.push_str(&indicator.to_lowercase());
    }
    text
}

fn has_keyword(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| {
        if kw.contains(|c: char| !c.is_ascii_alphanumeric()) {
            // phrases match anywhere
            text.contains(kw)
        } else {
            text.split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word_matches(word, kw))
        }
    })
}

fn word_matches(word: &str, keyword: &str) -> bool {
    match word.strip_prefix(keyword) {
        Some(rest) => rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn incident(id: &str, severity: &str) -> Incident {
        Incident {
            id: id.to_string(),
            severity: Some(severity.to_string()),
            detected_at: Some(now()),
            affected_systems: 1,
            category: String::new(),
            correlated_incidents: 0,
            ai_confidence: 0.0,
            indicators: vec![],
        }
    }

    #[test]
    fn test_severity_sets_priority() {
        assert_eq!(derive_priority(&incident("t", "high")), Priority::High);
        assert_eq!(derive_priority(&incident("t", "info")), Priority::Low);
    }

    #[test]
    fn test_unknown_severity_defaults_to_medium() {
        let mut i = incident("t", "???");
        assert_eq!(derive_priority(&i), Priority::Medium);

        i.severity = None;
        assert_eq!(derive_priority(&i), Priority::Medium);
    }

    #[test]
    fn test_confidence_raises_priority() {
        let mut i = incident("t", "unknown");
        i.ai_confidence = 91.0;
        assert_eq!(derive_priority(&i), Priority::Critical);

        i.ai_confidence = 80.0;
        assert_eq!(derive_priority(&i), Priority::High);

        let mut low = incident("t", "low");
        low.ai_confidence = 76.0;
        assert_eq!(derive_priority(&low), Priority::High);
    }

    #[test]
    fn test_confidence_never_downgrades() {
        let mut i = incident("t", "critical");
        i.ai_confidence = 65.0;
        assert_eq!(derive_priority(&i), Priority::Critical);
    }

    #[test]
    fn test_complexity_factors_and_clamp() {
        let simple = incident("t", "low");
        assert_eq!(derive_complexity(&simple), 1);

        let mut wide = incident("t", "low");
        wide.affected_systems = 11;
        wide.correlated_incidents = 6;
        assert_eq!(derive_complexity(&wide), 4);

        let mut apt = incident("t", "high");
        apt.category = "APT29 intrusion".to_string();
        apt.indicators = vec!["zero-day exploit".to_string()];
        assert_eq!(derive_complexity(&apt), 5);
    }

    #[test]
    fn test_estimated_minutes() {
        assert_eq!(estimate_minutes(1, Priority::Critical), 30);
        assert_eq!(estimate_minutes(2, Priority::High), 45);
        assert_eq!(estimate_minutes(3, Priority::Medium), 45);
        assert_eq!(estimate_minutes(1, Priority::Low), 12);
    }

    #[test]
    fn test_required_specializations() {
        let mut i = incident("t", "high");
        i.category = "Ransomware".to_string();
        i.indicators = vec!["credential phishing".to_string()];
        let tags = required_specializations(&i);
        assert!(tags.contains("Malware"));
        assert!(tags.contains("Phishing"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_specializations_default_to_general() {
        let mut i = incident("t", "high");
        i.category = "adapter misconfiguration".to_string();
        let tags = required_specializations(&i);
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(GENERAL_SPECIALIZATION));
    }

    #[test]
    fn test_urgency_age_penalty_capped() {
        let fresh = urgency(Priority::High, Some(now()), now());
        assert_eq!(fresh, 75.0);

        let ten_min = urgency(Priority::High, Some(now() - Duration::minutes(10)), now());
        assert_eq!(ten_min, 95.0);

        let old = urgency(Priority::Low, Some(now() - Duration::hours(5)), now());
        assert_eq!(old, 75.0);
    }

    #[test]
    fn test_future_detection_floors_age() {
        let u = urgency(Priority::Medium, Some(now() + Duration::minutes(30)), now());
        assert_eq!(u, 50.0);
    }

    #[test]
    fn test_resource_intensity_clamped() {
        let c = classify(&incident("t", "low"), now());
        assert_eq!(c.estimated_minutes, 12);
        assert_eq!(c.resource_intensity, 1);

        let mut heavy = incident("t", "critical");
        heavy.category = "apt".to_string();
        heavy.affected_systems = 50;
        let c = classify(&heavy, now());
        assert_eq!(c.complexity, 5);
        assert_eq!(c.resource_intensity, 10);
    }

    #[test]
    fn test_batch_sorted_by_urgency_stable() {
        let incidents = vec![
            incident("low-1", "low"),
            incident("crit-1", "critical"),
            incident("low-2", "low"),
            incident("crit-2", "critical"),
        ];
        let ids: Vec<String> = classify_batch(&incidents, now())
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["crit-1", "crit-2", "low-1", "low-2"]);
    }
}
