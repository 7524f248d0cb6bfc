//! Stand-in for a third-party site that forges payment approvals against the
//! CRM. For classroom use only.

mod config;
mod page;
mod routes;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_partners=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let app = routes::router(AppState {
        target_base: Arc::from(config.target_base.as_str()),
    })
    .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Partner lure site listening on {} (educational use only)", addr);
    info!("  Legacy target: http://localhost:{}/partners?target=legacy", config.port);
    info!("  Modern target: http://localhost:{}/partners?target=modern", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
