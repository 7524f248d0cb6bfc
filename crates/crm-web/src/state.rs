use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crm_db::{Clock, CsrfTokens, Database};

use crate::error::AppError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub csrf: CsrfTokens,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, csrf: CsrfTokens) -> AppState {
        Arc::new(Self { db, csrf })
    }

    /// Current time from the clock the token store was built with.
    pub fn now(&self) -> DateTime<Utc> {
        self.csrf.clock().now()
    }
}

/// Run a synchronous store call off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(AppError::Internal)
}
