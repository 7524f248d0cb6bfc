pub mod auth;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod payments;
pub mod render;
pub mod session;
pub mod state;
pub mod views;

use axum::{Router, routing::get};

pub use error::AppError;
pub use state::{AppState, AppStateInner};

/// Every CRM route behind the cookie session layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/auth", get(auth::legacy_login_page).post(auth::legacy_login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/feedback", get(feedback::show).post(feedback::submit))
        .route(
            "/feedback-secure",
            get(feedback::show_secure).post(feedback::submit_secure),
        )
        .route("/finance", get(payments::finance_page).post(payments::finance_submit))
        .route(
            "/approvals",
            get(payments::approvals_page).post(payments::approvals_submit),
        )
        .layer(session::layer())
        .with_state(state)
}
