//! Workload Distribution Engine
//!
//! Assigns classified security incidents to analysts under SAFE MODE limits.
//!
//! ## Structure
//! - `types`: incidents, analysts, workload snapshot, results
//! - `rules`: constants, SAFE MODE constraints, scoring profiles
//! - `classifier`: raw incident -> ClassifiedIncident
//! - `compliance`: SAFE MODE eligibility checks
//! - `scorer`: analyst suitability 0-100
//! - `balancer`: greedy batch assignment pass
//! - `health`: system health and recommendations
//!
//! ## Usage
//! ```ignore
//! use crate::engine::{run_pass, PassOptions, WorkloadSnapshot};
//!
//! let outcome = run_pass(&threats, &analysts, &WorkloadSnapshot::new(), &[], &PassOptions::default(), Utc::now())?;
//! for a in &outcome.result.assignments {
//!     println!("{} -> {}", a.threat_id, a.analyst_id);
//! }
//! ```

pub mod types;
pub mod rules;
pub mod classifier;
pub mod compliance;
pub mod scorer;
pub mod balancer;
pub mod health;


pub use types::{
    Analyst, Assignment, BalancingResult, HealthStatus, Incident, Priority, RecentAssignment,
    RoleTier, SafeModeRecommendation, SystemHealth, WorkloadSnapshot,
};

pub use rules::SafeModeConstraints;

pub use balancer::{run_pass, Algorithm, EngineError, PassOptions, PassOutcome, DEFAULT_TIME_WINDOW_MINUTES};

pub use health::{fallback_result, utilization, workload_label, WorkloadLabel};
