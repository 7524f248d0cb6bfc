use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crm_db::{CsrfTokens, Database};

/// Background task that sweeps spent tokens and prunes old audit rows.
/// The first pass runs immediately.
pub async fn run_maintenance_loop(db: Arc<Database>, tokens: CsrfTokens, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        let db = db.clone();
        let tokens = tokens.clone();
        match tokio::task::spawn_blocking(move || crm_db::maintenance::run(&db, &tokens)).await {
            Ok(report) => debug!("Maintenance finished: {:?}", report),
            Err(e) => warn!("Maintenance task panicked: {}", e),
        }
    }
}
