use axum::{
    Form,
    extract::State,
    http::{HeaderName, HeaderValue, header},
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::info;

use crm_types::forms::CommentForm;

use crate::error::AppError;
use crate::render::Renderer;
use crate::session::require_user;
use crate::state::{AppState, blocking};
use crate::views;

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; \
img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'";

const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");

fn hardening_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
    ]
}

async fn render(state: &AppState, renderer: Renderer) -> Result<Html<String>, AppError> {
    let db = state.db.clone();
    let comments = blocking(move || db.list_comments()).await?;
    Ok(Html(views::feedback(renderer, &comments)))
}

async fn store(state: &AppState, form: CommentForm) -> Result<(), AppError> {
    let db = state.db.clone();
    let CommentForm { username, content } = form;
    let now = state.now();
    let id = blocking(move || db.insert_comment(&username, &content, now)).await?;
    info!("Stored feedback #{}", id);
    Ok(())
}

// -- Vulnerable: stored comments are rendered verbatim --

pub async fn show(State(state): State<AppState>, session: Session) -> Result<Html<String>, AppError> {
    require_user(&session).await?;
    render(&state, Renderer::RAW).await
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CommentForm>,
) -> Result<Html<String>, AppError> {
    require_user(&session).await?;
    store(&state, form).await?;
    render(&state, Renderer::RAW).await
}

// -- Secure: escaped output plus browser hardening headers --

pub async fn show_secure(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    require_user(&session).await?;
    let page = render(&state, Renderer::STRUCTURAL).await?;
    Ok((hardening_headers(), page).into_response())
}

pub async fn submit_secure(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    require_user(&session).await?;
    store(&state, form).await?;
    let page = render(&state, Renderer::STRUCTURAL).await?;
    Ok((hardening_headers(), page).into_response())
}
