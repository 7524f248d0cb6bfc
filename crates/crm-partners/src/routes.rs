use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use crate::page::{self, Target};

#[derive(Clone)]
pub struct AppState {
    /// Origin of the CRM the lure posts to, e.g. `http://localhost:8080`.
    pub target_base: Arc<str>,
}

#[derive(Debug, Deserialize)]
pub struct LureQuery {
    pub target: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(lure))
        .route("/partners", get(lure))
        .with_state(state)
}

async fn lure(
    State(state): State<AppState>,
    Query(query): Query<LureQuery>,
) -> Html<String> {
    let target = Target::from_query(query.target.as_deref());
    let action_url = target.action_url(&state.target_base);
    info!("Serving lure page aimed at {}", action_url);
    Html(page::render(&action_url))
}
