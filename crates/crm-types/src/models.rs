use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An employee account as seen by the web layer. The password never leaves
/// the database crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A feedback entry or team message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub created: DateTime<Utc>,
}

/// A vendor payment waiting for (or holding) an approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub amount: f64,
    pub approved: bool,
    pub email: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
}

/// Customer touch-point (call, email, meeting, demo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub customer_id: i64,
    pub user_id: i64,
    pub kind: String,
    pub subject: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub customer_id: i64,
    pub user_id: i64,
    pub kind: String,
    pub subject: String,
    pub notes: Option<String>,
}

/// One row of the security audit trail. Old/new values are arbitrary JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_customers: i64,
    pub pending_payments: i64,
    pub pending_amount: f64,
    pub monthly_revenue: f64,
    pub monthly_comments: i64,
}

/// Counts of rows whose references point nowhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub orphaned_activities: i64,
    pub orphaned_payments: i64,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_activities == 0 && self.orphaned_payments == 0
    }
}
