//! Audit trail - best-effort record of every balancing pass
//!
//! Records always go to the tracing log. When `DATABASE_URL` is set they are
//! also written to Postgres on a background task; a failed write is logged
//! and never reaches the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::engine::{Assignment, BalancingResult, HealthStatus};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Apply the audit schema (idempotent)
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Audit schema applied successfully");
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS balancing_audit (
    id UUID PRIMARY KEY,
    roster VARCHAR(255) NOT NULL,
    outcome VARCHAR(20) NOT NULL,
    algorithm VARCHAR(50) NOT NULL,
    safe_mode BOOLEAN NOT NULL,
    total_threats INT NOT NULL,
    assigned_threats INT NOT NULL,
    unassigned_threats INT NOT NULL,
    health_status VARCHAR(20) NOT NULL,
    error TEXT,
    assignments JSONB,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_balancing_audit_roster ON balancing_audit(roster, recorded_at DESC);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcomeKind {
    Success,
    EngineFailure,
}

impl PassOutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassOutcomeKind::Success => "success",
            PassOutcomeKind::EngineFailure => "engine_failure",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub roster: String,
    pub outcome: PassOutcomeKind,
    pub algorithm: String,
    pub safe_mode: bool,
    pub total_threats: usize,
    pub assigned_threats: usize,
    pub unassigned_threats: usize,
    pub health_status: HealthStatus,
    pub error: Option<String>,
    pub assignments: Vec<Assignment>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_result(roster: &str, result: &BalancingResult, error: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            roster: roster.to_string(),
            outcome: if error.is_some() { PassOutcomeKind::EngineFailure } else { PassOutcomeKind::Success },
            algorithm: result.algorithm.to_string(),
            safe_mode: result.safe_mode,
            total_threats: result.total_threats,
            assigned_threats: result.assigned_threats,
            unassigned_threats: result.unassigned_threats,
            health_status: result.system_health.status,
            error,
            assignments: result.assignments.clone(),
            recorded_at: result.generated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum AuditLog {
    #[default]
    Tracing,
    Postgres(PgPool),
}

impl AuditLog {
    pub fn new(pool: Option<PgPool>) -> Self {
        match pool {
            Some(pool) => AuditLog::Postgres(pool),
            None => AuditLog::Tracing,
        }
    }

    pub fn sink_name(&self) -> &'static str {
        match self {
            AuditLog::Tracing => "tracing",
            AuditLog::Postgres(_) => "postgres",
        }
    }

    /// Never blocks the request; database writes run on their own task
    pub fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: "audit",
            roster = %record.roster,
            outcome = record.outcome.as_str(),
            algorithm = %record.algorithm,
            assigned = record.assigned_threats,
            total = record.total_threats,
            "Balancing pass recorded"
        );

        if let AuditLog::Postgres(pool) = self {
            let pool = pool.clone();
            tokio::spawn(async move {
                if let Err(e) = insert(&pool, &record).await {
                    tracing::warn!("Audit write failed for pass {}: {}", record.id, e);
                }
            });
        }
    }
}

async fn insert(pool: &PgPool, record: &AuditRecord) -> Result<(), sqlx::Error> {
    let assignments = serde_json::to_value(&record.assignments)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let health = serde_json::to_value(record.health_status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO balancing_audit
            (id, roster, outcome, algorithm, safe_mode, total_threats, assigned_threats,
             unassigned_threats, health_status, error, assignments, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(record.id)
    .bind(&record.roster)
    .bind(record.outcome.as_str())
    .bind(&record.algorithm)
    .bind(record.safe_mode)
    .bind(record.total_threats as i32)
    .bind(record.assigned_threats as i32)
    .bind(record.unassigned_threats as i32)
    .bind(health)
    .bind(&record.error)
    .bind(assignments)
    .bind(record.recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{fallback_result, PassOptions};

    #[test]
    fn test_record_marks_engine_failures() {
        let now = Utc::now();
        let fallback = fallback_result(&[], &PassOptions::default(), now, "timeout");
        let record = AuditRecord::from_result("blue", &fallback, Some("timeout".to_string()));

        assert_eq!(record.outcome, PassOutcomeKind::EngineFailure);
        assert_eq!(record.health_status, HealthStatus::Critical);
        assert_eq!(record.roster, "blue");
        assert_eq!(record.recorded_at, now);
    }

    #[test]
    fn test_tracing_sink_is_default() {
        assert!(matches!(AuditLog::new(None), AuditLog::Tracing));
    }
}
