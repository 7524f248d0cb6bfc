use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crm_types::models::IntegrityReport;

use crate::Database;
use crate::clock::Clock;
use crate::csrf::CsrfTokens;
use crate::timestamp;

/// Audit rows older than this are pruned.
pub const AUDIT_RETENTION_DAYS: i64 = 30;

/// What one maintenance pass removed. `None` means that step failed and was
/// skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub csrf_tokens_removed: Option<usize>,
    pub audit_rows_removed: Option<usize>,
    pub vacuumed: bool,
}

impl Database {
    /// Delete audit entries created before `cutoff`.
    pub fn prune_audit_log(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM audit_log WHERE created_at < ?1",
                [timestamp::to_sql(cutoff)],
            )?;
            Ok(n)
        })
    }

    pub fn vacuum(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch("VACUUM")?;
            Ok(())
        })
    }

    /// Count activities pointing at missing customers and payments approved
    /// by unknown users.
    pub fn integrity_report(&self) -> Result<IntegrityReport> {
        self.with_conn(|conn| {
            let orphaned_activities = conn.query_row(
                "SELECT COUNT(*) FROM activities a
                 LEFT JOIN customers c ON a.customer_id = c.id
                 WHERE c.id IS NULL",
                [],
                |row| row.get(0),
            )?;
            let orphaned_payments = conn.query_row(
                "SELECT COUNT(*) FROM payments p
                 WHERE p.approved_by IS NOT NULL
                   AND p.approved_by NOT IN (SELECT username FROM users)",
                [],
                |row| row.get(0),
            )?;
            Ok(IntegrityReport {
                orphaned_activities,
                orphaned_payments,
            })
        })
    }
}

/// One maintenance pass: sweep CSRF tokens, prune old audit rows, vacuum.
/// Each step is independent; failures are logged and the pass continues.
pub fn run(db: &Database, tokens: &CsrfTokens) -> MaintenanceReport {
    let mut report = MaintenanceReport::default();

    match tokens.sweep() {
        Ok(n) => report.csrf_tokens_removed = Some(n),
        Err(e) => warn!("Error cleaning up CSRF tokens: {:#}", e),
    }

    let cutoff = tokens.clock().now() - Duration::days(AUDIT_RETENTION_DAYS);
    match db.prune_audit_log(cutoff) {
        Ok(n) => report.audit_rows_removed = Some(n),
        Err(e) => warn!("Error cleaning audit log: {:#}", e),
    }

    match db.vacuum() {
        Ok(()) => report.vacuumed = true,
        Err(e) => warn!("Error vacuuming database: {:#}", e),
    }

    match db.integrity_report() {
        Ok(r) if !r.is_clean() => warn!(
            "Integrity check: {} orphaned activities, {} payments approved by unknown users",
            r.orphaned_activities, r.orphaned_payments
        ),
        Ok(_) => {}
        Err(e) => warn!("Integrity check failed: {:#}", e),
    }

    info!(
        "Maintenance pass: {:?} tokens, {:?} audit rows removed",
        report.csrf_tokens_removed, report.audit_rows_removed
    );
    report
}
