//! Single-use anti-forgery tokens.
//!
//! A token is issued for every render of a form that changes state, lives for
//! one hour, and is consumed by the first successful validation. Tokens are
//! not tied to a session or to a particular form: any live token unlocks any
//! protected action.

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::Duration;
use rand_core::{OsRng, RngCore};
use rusqlite::params;
use tracing::debug;

use crate::Database;
use crate::clock::Clock;
use crate::models::CsrfTokenRow;
use crate::queries::OptionalExt;
use crate::timestamp;

/// Raw entropy per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Lifetime of an issued token.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Issues, validates and sweeps tokens stored in `csrf_tokens`.
#[derive(Clone)]
pub struct CsrfTokens {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl CsrfTokens {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Generate and persist a fresh token.
    ///
    /// The value is only handed out once the row is stored; a failed insert
    /// is an error, so a caller can never embed a token that would not
    /// validate later.
    pub fn issue(&self) -> Result<String> {
        let token = generate_token();
        let now = self.clock.now();
        let expires_at = now + Duration::seconds(TOKEN_TTL_SECS);

        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO csrf_tokens (token, created_at, expires_at, used) VALUES (?1, ?2, ?3, FALSE)",
                    params![token, timestamp::to_sql(now), timestamp::to_sql(expires_at)],
                )?;
                Ok(())
            })
            .context("storing CSRF token")?;

        debug!("Issued CSRF token expiring at {}", expires_at);
        Ok(token)
    }

    /// Consume `token`. Returns `Ok(true)` exactly once per issued token,
    /// while it is unexpired.
    ///
    /// The check and the `used` flip are one conditional UPDATE, so racing
    /// validations of the same value agree on a single winner. A token that
    /// is already spent or expired is deleted on the way out.
    pub fn validate(&self, token: &str) -> Result<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        let now = timestamp::to_sql(self.clock.now());

        self.db.with_conn(|conn| {
            let consumed = conn.execute(
                "UPDATE csrf_tokens SET used = TRUE
                 WHERE token = ?1 AND used = FALSE AND expires_at > ?2",
                params![token, now],
            )?;
            if consumed == 1 {
                return Ok(true);
            }

            let discarded = conn.execute(
                "DELETE FROM csrf_tokens WHERE token = ?1 AND (used = TRUE OR expires_at <= ?2)",
                params![token, now],
            )?;
            if discarded > 0 {
                debug!("Discarded spent or expired CSRF token");
            }
            Ok(false)
        })
    }

    /// Delete every used or expired token. Returns how many rows went away.
    pub fn sweep(&self) -> Result<usize> {
        let now = timestamp::to_sql(self.clock.now());
        let removed = self.db.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM csrf_tokens WHERE used = TRUE OR expires_at < ?1",
                [now],
            )?;
            Ok(n)
        })?;

        if removed > 0 {
            debug!("Swept {} CSRF tokens", removed);
        }
        Ok(removed)
    }

    /// Look up a stored token without consuming it.
    pub fn get(&self, token: &str) -> Result<Option<CsrfTokenRow>> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT token, created_at, expires_at, used FROM csrf_tokens WHERE token = ?1",
                    [token],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, bool>(3)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(token, created_at, expires_at, used)| -> Result<CsrfTokenRow> {
                Ok(CsrfTokenRow {
                    created_at: timestamp::from_sql(&created_at)
                        .with_context(|| format!("bad created_at '{}'", created_at))?,
                    expires_at: timestamp::from_sql(&expires_at)
                        .with_context(|| format!("bad expires_at '{}'", expires_at))?,
                    token,
                    used,
                })
            })
            .transpose()
        })
    }

    /// Number of stored tokens, live or not.
    #[cfg(test)]
    fn stored(&self) -> Result<usize> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM csrf_tokens", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

/// 32 bytes from the OS RNG, URL-safe base64 without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    B64.encode(bytes)
}
