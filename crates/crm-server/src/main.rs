mod config;
mod maintenance;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crm_db::{CsrfTokens, Database, SystemClock};
use crm_web::AppStateInner;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm=debug,crm_web=debug,crm_db=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let tokens = CsrfTokens::new(db.clone(), Arc::new(SystemClock));

    tokio::spawn(maintenance::run_maintenance_loop(
        db.clone(),
        tokens.clone(),
        config.maintenance_interval,
    ));

    let app = crm_web::router(AppStateInner::new(db, tokens)).layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Globomantics CRM listening on {}", addr);
    info!("Secure login: http://localhost:{}/login", config.port);
    info!("Legacy login: http://localhost:{}/auth", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
