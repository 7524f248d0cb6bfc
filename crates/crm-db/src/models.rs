//! Row types internal to the store. Everything user-facing lives in crm-types.

use chrono::{DateTime, Utc};

/// Stored anti-forgery token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfTokenRow {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

#[cfg(test)]
impl CsrfTokenRow {
    /// Whether a validation at `now` would accept this token.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}
