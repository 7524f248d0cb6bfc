//! Credential checks, written two ways.
//!
//! [`Database::authenticate_concatenated`] pastes the submitted values into
//! the SQL text and is injectable. [`Database::authenticate`] binds them as
//! parameters. Both run the same query against the same table; they are kept
//! apart so the lab can show one beside the other.

use anyhow::Result;
use tracing::info;

use crm_types::models::User;

use crate::Database;
use crate::queries::{OptionalExt, map_user};

impl Database {
    /// Legacy login. Builds the WHERE clause with string formatting, so a
    /// quote in either field changes the statement.
    pub fn authenticate_concatenated(&self, username: &str, password: &str) -> Result<Option<User>> {
        let sql = concatenated_login_sql(username, password);
        info!("Executing legacy login query: {}", sql);

        self.with_conn(|conn| conn.query_row(&sql, [], map_user).optional())
    }

    /// Parameterized login.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, email FROM users WHERE username = ?1 AND password = ?2",
                (username, password),
                map_user,
            )
            .optional()
        })
    }
}

pub fn concatenated_login_sql(username: &str, password: &str) -> String {
    format!(
        "SELECT id, username, email FROM users WHERE username = '{}' AND password = '{}'",
        username, password
    )
}
