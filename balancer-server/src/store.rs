//! Roster Store
//!
//! In-process workload state per roster. Every roster sits behind its own
//! async mutex so passes on one roster run one at a time while different
//! rosters proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::engine::{Assignment, BalancingResult, PassOutcome, Priority, RecentAssignment, WorkloadSnapshot};

pub const DEFAULT_ROSTER: &str = "default";

/// Released history older than this is dropped during settling
pub const HISTORY_RETENTION_MINUTES: i64 = 1440;

/// One committed assignment, kept for SAFE MODE windows and settling
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub analyst_id: String,
    pub threat_id: String,
    pub priority: Priority,
    pub minutes: u32,
    pub assigned_at: DateTime<Utc>,
    pub completes_at: DateTime<Utc>,
    pub released: bool,
}

impl From<&Assignment> for HistoryEntry {
    fn from(a: &Assignment) -> Self {
        Self {
            analyst_id: a.analyst_id.clone(),
            threat_id: a.threat_id.clone(),
            priority: a.priority,
            minutes: a.estimated_minutes,
            assigned_at: a.assigned_at,
            completes_at: a.estimated_completion,
            released: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct RosterState {
    pub snapshot: WorkloadSnapshot,
    pub history: Vec<HistoryEntry>,
    pub last_result: Option<BalancingResult>,
    pub passes: u64,
    /// Set once the roster has been removed from the store
    retired: bool,
}

impl RosterState {
    /// Release minutes of work whose estimated completion has passed and
    /// prune old released entries. Returns the minutes released.
    pub fn settle(&mut self, now: DateTime<Utc>) -> u32 {
        let mut released = 0u32;
        for entry in self.history.iter_mut().filter(|e| !e.released && e.completes_at <= now) {
            self.snapshot.release(&entry.analyst_id, entry.minutes);
            entry.released = true;
            released = released.saturating_add(entry.minutes);
        }

        let horizon = now - Duration::minutes(HISTORY_RETENTION_MINUTES);
        self.history.retain(|e| !(e.released && e.assigned_at < horizon));

        if released > 0 {
            tracing::debug!("Settled {} finished minutes", released);
        }
        released
    }

    /// Stored snapshot with caller-supplied values laid over it
    pub fn effective_snapshot(&self, overrides: Option<&WorkloadSnapshot>) -> WorkloadSnapshot {
        let mut snapshot = self.snapshot.clone();
        if let Some(overrides) = overrides {
            snapshot.merge(overrides);
        }
        snapshot
    }

    pub fn recent_assignments(&self) -> Vec<RecentAssignment> {
        self.history
            .iter()
            .map(|e| RecentAssignment {
                analyst_id: e.analyst_id.clone(),
                threat_id: e.threat_id.clone(),
                priority: e.priority,
                assigned_at: e.assigned_at,
            })
            .collect()
    }

    /// Apply a successful pass as a single unit. Only the minutes the pass
    /// assigned are added; caller overrides apply to their own request.
    pub fn commit(&mut self, outcome: PassOutcome) -> &BalancingResult {
        for assignment in &outcome.result.assignments {
            self.snapshot.commit(&assignment.analyst_id, assignment.estimated_minutes);
        }
        self.history.extend(outcome.result.assignments.iter().map(HistoryEntry::from));
        self.passes += 1;
        self.last_result.insert(outcome.result)
    }

    /// Keep the fallback visible to `recommendations`; workload is untouched
    pub fn record_failure(&mut self, fallback: BalancingResult) {
        self.last_result = Some(fallback);
    }
}

#[derive(Debug, Default)]
pub struct WorkloadStore {
    rosters: Mutex<HashMap<String, Arc<AsyncMutex<RosterState>>>>,
}

impl WorkloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a roster for a pass, creating it on first use
    pub async fn lock_roster(&self, id: &str) -> OwnedMutexGuard<RosterState> {
        loop {
            let roster = self
                .rosters
                .lock()
                .entry(id.to_string())
                .or_default()
                .clone();
            let guard = roster.lock_owned().await;
            // removed while we waited; the next iteration registers a fresh one
            if !guard.retired {
                return guard;
            }
        }
    }

    /// Existing roster only; lookups never register new entries
    pub fn get(&self, id: &str) -> Option<Arc<AsyncMutex<RosterState>>> {
        self.rosters.lock().get(id).cloned()
    }

    /// Drop a roster and everything recorded for it. Returns false if unknown.
    pub async fn remove(&self, id: &str) -> bool {
        let Some(roster) = self.get(id) else {
            return false;
        };
        let mut guard = roster.lock().await;
        guard.retired = true;

        let mut rosters = self.rosters.lock();
        if rosters.get(id).is_some_and(|current| Arc::ptr_eq(current, &roster)) {
            rosters.remove(id);
        }
        true
    }

    pub fn roster_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rosters.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{run_pass, Analyst, Incident, PassOptions};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn critical(id: &str) -> Incident {
        Incident {
            id: id.to_string(),
            severity: Some("critical".to_string()),
            detected_at: Some(now()),
            affected_systems: 1,
            category: String::new(),
            correlated_incidents: 0,
            ai_confidence: 0.0,
            indicators: vec![],
        }
    }

    fn committed_state() -> RosterState {
        let mut state = RosterState::default();
        let outcome = run_pass(
            &[critical("t-1")],
            &[Analyst::new("a1")],
            &state.effective_snapshot(None),
            &[],
            &PassOptions::default(),
            now(),
        )
        .unwrap();
        state.commit(outcome);
        state
    }

    #[test]
    fn test_commit_records_snapshot_and_history() {
        let state = committed_state();
        assert_eq!(state.snapshot.minutes("a1"), 30);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.passes, 1);
        assert!(state.last_result.is_some());

        let recent = state.recent_assignments();
        assert_eq!(recent[0].analyst_id, "a1");
        assert_eq!(recent[0].priority, Priority::Critical);
    }

    #[test]
    fn test_settle_releases_finished_work_once() {
        let mut state = committed_state();

        assert_eq!(state.settle(now() + Duration::minutes(10)), 0);
        assert_eq!(state.snapshot.minutes("a1"), 30);

        assert_eq!(state.settle(now() + Duration::minutes(30)), 30);
        assert_eq!(state.snapshot.minutes("a1"), 0);
        assert_eq!(state.settle(now() + Duration::minutes(45)), 0);

        // Released entries still count toward SAFE MODE until they age out
        assert_eq!(state.history.len(), 1);
        state.settle(now() + Duration::minutes(HISTORY_RETENTION_MINUTES + 1));
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_overrides_do_not_touch_stored_snapshot() {
        let state = committed_state();
        let overrides: WorkloadSnapshot = vec![("a1".to_string(), 200)].into_iter().collect();

        let effective = state.effective_snapshot(Some(&overrides));
        assert_eq!(effective.minutes("a1"), 200);
        assert_eq!(state.snapshot.minutes("a1"), 30);
    }

    #[test]
    fn test_failure_keeps_workload() {
        let mut state = committed_state();
        let fallback = crate::engine::fallback_result(&[critical("t-2")], &PassOptions::default(), now(), "boom");
        state.record_failure(fallback);

        assert_eq!(state.snapshot.minutes("a1"), 30);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.last_result.as_ref().unwrap().assigned_threats, 0);
    }

    #[test]
    fn test_overrides_are_not_persisted() {
        let mut state = RosterState::default();
        state.snapshot.set("a1", 20);
        let overrides: WorkloadSnapshot = vec![("a1".to_string(), 200)].into_iter().collect();

        let outcome = run_pass(
            &[critical("t-1")],
            &[Analyst::new("a1")],
            &state.effective_snapshot(Some(&overrides)),
            &[],
            &PassOptions::default(),
            now(),
        )
        .unwrap();
        assert_eq!(outcome.snapshot.minutes("a1"), 230);

        state.commit(outcome);
        assert_eq!(state.snapshot.minutes("a1"), 50);

        state.settle(now() + Duration::minutes(30));
        assert_eq!(state.snapshot.minutes("a1"), 20);
    }

    #[tokio::test]
    async fn test_store_hands_out_one_state_per_roster() {
        let store = WorkloadStore::new();
        store.lock_roster("blue").await.snapshot.set("a1", 90);

        assert_eq!(store.lock_roster("blue").await.snapshot.minutes("a1"), 90);
        assert_eq!(store.lock_roster("red").await.snapshot.minutes("a1"), 0);
        assert_eq!(store.roster_ids(), vec!["blue".to_string(), "red".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_does_not_register() {
        let store = WorkloadStore::new();
        assert!(store.get("ghost").is_none());
        assert!(!store.remove("ghost").await);
        assert!(store.roster_ids().is_empty());
    }

    #[tokio::test]
    async fn test_remove_drops_roster() {
        let store = WorkloadStore::new();
        store.lock_roster("blue").await.snapshot.set("a1", 90);

        assert!(store.remove("blue").await);
        assert!(store.get("blue").is_none());
        assert!(store.roster_ids().is_empty());

        // a later pass starts from an empty state
        assert!(store.lock_roster("blue").await.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_waiting_pass_skips_removed_roster() {
        let store = Arc::new(WorkloadStore::new());
        let held = store.lock_roster("blue").await;

        // removal queues on the lock first, the pass right behind it
        let remover = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.remove("blue").await })
        };
        tokio::task::yield_now().await;

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut guard = store.lock_roster("blue").await;
                guard.snapshot.set("a1", 15);
            })
        };
        tokio::task::yield_now().await;
        drop(held);

        assert!(remover.await.unwrap());
        waiter.await.unwrap();

        let roster = store.get("blue").unwrap();
        assert_eq!(roster.lock().await.snapshot.minutes("a1"), 15);
    }
}
