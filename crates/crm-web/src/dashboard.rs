use axum::{extract::State, response::Html};
use tower_sessions::Session;

use crate::error::AppError;
use crate::render::Renderer;
use crate::session::require_user;
use crate::state::{AppState, blocking};
use crate::views;

const RECENT_ACTIVITIES: u32 = 5;
const CUSTOMER_PREVIEW: u32 = 10;

pub async fn dashboard(State(state): State<AppState>, session: Session) -> Result<Html<String>, AppError> {
    let username = require_user(&session).await?;

    let db = state.db.clone();
    let now = state.now();
    let (stats, activities, customers) = blocking(move || {
        let stats = db.dashboard_stats(now)?;
        let activities = db.recent_activities(RECENT_ACTIVITIES)?;
        let customers = db.search_customers("", CUSTOMER_PREVIEW)?;
        Ok((stats, activities, customers))
    })
    .await?;

    Ok(Html(views::dashboard(
        Renderer::STRUCTURAL,
        &username,
        &stats,
        &activities,
        &customers,
    )))
}
