use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{Connection, Row, params};

use crm_types::models::{
    Activity, AuditEntry, Comment, Customer, DashboardStats, NewActivity, NewCustomer, Payment, User,
};

use crate::Database;
use crate::timestamp;

impl Database {
    // -- Users --

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, email FROM users WHERE username = ?1",
                [username],
                map_user,
            )
            .optional()
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, username: &str, content: &str, now: DateTime<Utc>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (username, content, created) VALUES (?1, ?2, ?3)",
                (username, content, timestamp::to_sql(now)),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn list_comments(&self) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, content, created FROM comments ORDER BY created DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    let created: String = row.get(3)?;
                    let id: i64 = row.get(0)?;
                    Ok(Comment {
                        id,
                        username: row.get(1)?,
                        content: row.get(2)?,
                        created: timestamp::from_sql_lossy(&created, &format!("comment {}", id)),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Payments --

    /// Newest first.
    pub fn list_payments(&self) -> Result<Vec<Payment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, amount, email, approved, description, created_at, approved_at, approved_by
                 FROM payments ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], map_payment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_payment(&self, id: i64) -> Result<Option<Payment>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, amount, email, approved, description, created_at, approved_at, approved_by
                 FROM payments WHERE id = ?1",
                [id],
                map_payment,
            )
            .optional()
        })
    }

    /// Mark a payment approved by `approver` at `now`. Returns false if no
    /// such payment.
    pub fn approve_payment(&self, id: i64, approver: &str, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE payments
                 SET approved = TRUE,
                     approved_at = ?1,
                     approved_by = ?2
                 WHERE id = ?3",
                params![timestamp::to_sql(now), approver, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Reset a payment to pending. Returns false if no such payment.
    pub fn disapprove_payment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE payments SET approved = FALSE, approved_at = NULL, approved_by = NULL WHERE id = ?1",
                [id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Customers --

    pub fn create_customer(&self, customer: &NewCustomer) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO customers (first_name, last_name, email, phone, company, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    customer.first_name,
                    customer.last_name,
                    customer.email,
                    customer.phone,
                    customer.company,
                    customer.status
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, first_name, last_name, email, phone, company, status, created_at, updated_at
                 FROM customers WHERE email = ?1",
                [email],
                map_customer,
            )
            .optional()
        })
    }

    /// Substring match on first name, last name, email or company.
    /// An empty term lists everyone.
    pub fn search_customers(&self, term: &str, limit: u32) -> Result<Vec<Customer>> {
        let pattern = format!("%{}%", term);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, email, phone, company, status, created_at, updated_at
                 FROM customers
                 WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR email LIKE ?1 OR company LIKE ?1
                 ORDER BY first_name, last_name
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![pattern, limit], map_customer)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Activities --

    pub fn log_activity(&self, activity: &NewActivity) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO activities (customer_id, user_id, type, subject, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    activity.customer_id,
                    activity.user_id,
                    activity.kind,
                    activity.subject,
                    activity.notes
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_customer_activities(&self, customer_id: i64) -> Result<Vec<Activity>> {
        self.with_conn(|conn| query_activities(conn, Some(customer_id), 1000))
    }

    pub fn recent_activities(&self, limit: u32) -> Result<Vec<Activity>> {
        self.with_conn(|conn| query_activities(conn, None, limit))
    }

    // -- Audit --

    pub fn record_audit(&self, entry: &AuditEntry, now: DateTime<Utc>) -> Result<()> {
        let old_values = entry.old_values.as_ref().map(|v| v.to_string());
        let new_values = entry.new_values.as_ref().map(|v| v.to_string());

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO audit_log (user_id, username, action, table_name, record_id,
                                        old_values, new_values, ip_address, user_agent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    entry.user_id,
                    entry.username,
                    entry.action,
                    entry.table_name,
                    entry.record_id,
                    old_values,
                    new_values,
                    entry.ip_address,
                    entry.user_agent,
                    timestamp::to_sql(now)
                ],
            )?;
            Ok(())
        })
    }

    /// Most recent audit entries, newest first.
    pub fn recent_audit(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, username, action, table_name, record_id, old_values, new_values,
                        ip_address, user_agent
                 FROM audit_log ORDER BY created_at DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    let old: Option<String> = row.get(5)?;
                    let new: Option<String> = row.get(6)?;
                    Ok(AuditEntry {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        action: row.get(2)?,
                        table_name: row.get(3)?,
                        record_id: row.get(4)?,
                        old_values: old.and_then(|s| serde_json::from_str(&s).ok()),
                        new_values: new.and_then(|s| serde_json::from_str(&s).ok()),
                        ip_address: row.get(7)?,
                        user_agent: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Dashboard --

    /// Headline numbers. "This month" is the calendar month containing `now`.
    pub fn dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let month_start = timestamp::to_sql(start_of_month(now));
        self.with_conn(|conn| {
            let active_customers = conn.query_row(
                "SELECT COUNT(*) FROM customers WHERE status = 'active'",
                [],
                |row| row.get(0),
            )?;
            let pending_payments = conn.query_row(
                "SELECT COUNT(*) FROM payments WHERE approved = FALSE",
                [],
                |row| row.get(0),
            )?;
            let pending_amount = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM payments WHERE approved = FALSE",
                [],
                |row| row.get(0),
            )?;
            let monthly_revenue = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM payments
                 WHERE approved = TRUE AND approved_at >= ?1",
                [&month_start],
                |row| row.get(0),
            )?;
            let monthly_comments = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE created >= ?1",
                [&month_start],
                |row| row.get(0),
            )?;

            Ok(DashboardStats {
                active_customers,
                pending_payments,
                pending_amount,
                monthly_revenue,
                monthly_comments,
            })
        })
    }
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
        .unwrap_or(now)
}

pub(crate) fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
    })
}

fn map_payment(row: &Row<'_>) -> rusqlite::Result<Payment> {
    let id: i64 = row.get(0)?;
    let created_at: String = row.get(5)?;
    let approved_at: Option<String> = row.get(6)?;
    Ok(Payment {
        id,
        amount: row.get(1)?,
        email: row.get(2)?,
        approved: row.get(3)?,
        description: row.get(4)?,
        created_at: timestamp::from_sql_lossy(&created_at, &format!("payment {}", id)),
        approved_at: approved_at.as_deref().and_then(timestamp::from_sql),
        approved_by: row.get(7)?,
    })
}

fn map_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    let id: i64 = row.get(0)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    let context = format!("customer {}", id);
    Ok(Customer {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        company: row.get(5)?,
        status: row.get(6)?,
        created_at: timestamp::from_sql_lossy(&created_at, &context),
        updated_at: timestamp::from_sql_lossy(&updated_at, &context),
    })
}

fn query_activities(conn: &Connection, customer_id: Option<i64>, limit: u32) -> Result<Vec<Activity>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_id, user_id, type, subject, notes, created_at
         FROM activities
         WHERE ?1 IS NULL OR customer_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(params![customer_id, limit], |row| {
            let id: i64 = row.get(0)?;
            let created_at: String = row.get(6)?;
            Ok(Activity {
                id,
                customer_id: row.get(1)?,
                user_id: row.get(2)?,
                kind: row.get(3)?,
                subject: row.get(4)?,
                notes: row.get(5)?,
                created_at: timestamp::from_sql_lossy(&created_at, &format!("activity {}", id)),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn seeded_users_are_found_by_username() {
        let db = db();
        let user = db.get_user_by_username("sarah.connor").unwrap().unwrap();
        assert_eq!(user.email, "sarah.connor@globomantics.com");
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn comments_are_listed_newest_first() {
        let db = db();
        let id = db.insert_comment("Visitor", "<b>hello</b>", Utc::now()).unwrap();

        let comments = db.list_comments().unwrap();
        assert_eq!(comments.len(), 4);
        assert_eq!(comments[0].id, id);
        assert_eq!(comments[0].content, "<b>hello</b>");
    }

    #[test]
    fn approve_and_disapprove_by_id() {
        let db = db();

        assert!(db.approve_payment(1, "john.doe", Utc::now()).unwrap());
        let payment = db.get_payment(1).unwrap().unwrap();
        assert!(payment.approved);
        assert_eq!(payment.approved_by.as_deref(), Some("john.doe"));
        assert!(payment.approved_at.is_some());

        assert!(db.disapprove_payment(1).unwrap());
        let payment = db.get_payment(1).unwrap().unwrap();
        assert!(!payment.approved);
        assert!(payment.approved_by.is_none());
        assert!(payment.approved_at.is_none());
    }

    #[test]
    fn unknown_payment_is_not_updated() {
        let db = db();
        assert!(!db.approve_payment(9999, "john.doe", Utc::now()).unwrap());
        assert!(!db.disapprove_payment(9999).unwrap());
        assert!(db.get_payment(9999).unwrap().is_none());
    }

    #[test]
    fn customer_search_matches_company_and_respects_limit() {
        let db = db();
        let hits = db.search_customers("Tech", 10).unwrap();
        let companies: Vec<_> = hits.iter().filter_map(|c| c.company.clone()).collect();
        assert!(companies.contains(&"TechCorp Industries".to_string()));
        assert!(companies.contains(&"InnovateTech Solutions".to_string()));

        assert_eq!(db.search_customers("", 2).unwrap().len(), 2);
        assert!(db.search_customers("' OR 1=1 --", 10).unwrap().is_empty());
    }

    #[test]
    fn created_customer_can_be_fetched_and_gets_activities() {
        let db = db();
        let id = db
            .create_customer(&NewCustomer {
                first_name: "Frank".into(),
                last_name: "Lee".into(),
                email: "frank.lee@example.com".into(),
                phone: None,
                company: Some("Lee Logistics".into()),
                status: "prospect".into(),
            })
            .unwrap();

        let customer = db.get_customer_by_email("frank.lee@example.com").unwrap().unwrap();
        assert_eq!(customer.id, id);
        assert_eq!(customer.full_name(), "Frank Lee");

        db.log_activity(&NewActivity {
            customer_id: id,
            user_id: 1,
            kind: "call".into(),
            subject: "Intro".into(),
            notes: None,
        })
        .unwrap();

        let activities = db.get_customer_activities(id).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].subject, "Intro");
        assert_eq!(db.recent_activities(3).unwrap().len(), 3);
    }

    #[test]
    fn audit_entries_round_trip_json_values() {
        let db = db();
        db.record_audit(&AuditEntry {
            username: Some("admin".into()),
            action: "payment.approve".into(),
            table_name: Some("payments".into()),
            record_id: Some(2),
            new_values: Some(serde_json::json!({ "approved": true })),
            ..Default::default()
        }, Utc::now())
        .unwrap();

        let entries = db.recent_audit(5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "payment.approve");
        assert_eq!(entries[0].new_values, Some(serde_json::json!({ "approved": true })));
        assert!(entries[0].old_values.is_none());
    }

    #[test]
    fn dashboard_stats_reflect_seed_and_approvals() {
        let db = db();
        let before = db.dashboard_stats(Utc::now()).unwrap();
        assert_eq!(before.active_customers, 4);
        assert_eq!(before.pending_payments, 5);
        assert_eq!(before.monthly_revenue, 0.0);
        assert_eq!(before.monthly_comments, 3);

        db.approve_payment(1, "admin", Utc::now()).unwrap();
        let after = db.dashboard_stats(Utc::now()).unwrap();
        assert_eq!(after.pending_payments, 4);
        assert!((after.monthly_revenue - 15750.0).abs() < f64::EPSILON);
        assert!((before.pending_amount - after.pending_amount - 15750.0).abs() < 1e-6);
    }

    #[test]
    fn monthly_figures_follow_the_given_clock() {
        let db = db();
        let jan_end = Utc.with_ymd_and_hms(2031, 1, 31, 23, 0, 0).unwrap();

        db.approve_payment(1, "admin", jan_end).unwrap();
        db.insert_comment("Visitor", "late January", jan_end).unwrap();

        let january = db.dashboard_stats(jan_end).unwrap();
        assert!((january.monthly_revenue - 15750.0).abs() < 1e-6);
        assert_eq!(january.monthly_comments, 1);

        let february = db.dashboard_stats(jan_end + Duration::hours(2)).unwrap();
        assert_eq!(february.monthly_revenue, 0.0);
        assert_eq!(february.monthly_comments, 0);
        assert_eq!(february.pending_payments, 4);

        let stamped = db.get_payment(1).unwrap().unwrap();
        assert_eq!(stamped.approved_at, Some(jan_end));
    }

    #[test]
    fn month_start_is_midnight_on_the_first() {
        let now = Utc.with_ymd_and_hms(2031, 3, 17, 12, 30, 5).unwrap();
        assert_eq!(start_of_month(now), Utc.with_ymd_and_hms(2031, 3, 1, 0, 0, 0).unwrap());
    }
}
