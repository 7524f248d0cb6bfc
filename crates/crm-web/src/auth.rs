use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, warn};

use crm_types::forms::LoginForm;

use crate::error::AppError;
use crate::render::Renderer;
use crate::session::{current_user, sign_in, sign_out};
use crate::state::{AppState, blocking};
use crate::views::{self, LoginVariant};

pub async fn home(session: Session) -> Result<Response, AppError> {
    if current_user(&session).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(Html(views::home()).into_response())
}

pub async fn login_page() -> Html<String> {
    Html(views::login(LoginVariant::Portal))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let db = state.db.clone();
    let LoginForm { username, password } = form;
    let attempted = username.clone();
    let user = blocking(move || db.authenticate(&username, &password)).await?;

    let Some(user) = user else {
        warn!("Failed login for '{}'", attempted);
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    sign_in(&session, &user.username).await?;
    info!("User '{}' signed in", user.username);
    Ok(Redirect::to("/dashboard").into_response())
}

pub async fn legacy_login_page() -> Html<String> {
    Html(views::login(LoginVariant::Legacy))
}

/// Legacy sign-in. The query is assembled by string concatenation and the
/// database error text is echoed back to the client.
pub async fn legacy_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let db = state.db.clone();
    let LoginForm { username, password } = form;
    let outcome = blocking(move || Ok(db.authenticate_concatenated(&username, &password))).await?;

    let user = match outcome {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::Unauthorized("Login failed: no matching user".into())),
        Err(e) => return Err(AppError::Unauthorized(format!("Login failed: {:#}", e))),
    };

    sign_in(&session, &user.username).await?;
    info!("User '{}' signed in through the legacy system", user.username);
    Ok(Html(views::legacy_login_success(Renderer::RAW, &user)).into_response())
}

pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    sign_out(&session).await?;
    Ok(Redirect::to("/"))
}
