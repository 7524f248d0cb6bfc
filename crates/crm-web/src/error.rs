use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

/// Per-request failure. Nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No signed-in user; the browser is sent to the login page.
    #[error("login required")]
    LoginRequired,

    #[error("{0}")]
    Unauthorized(String),

    /// Anti-forgery check failed.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn csrf_rejected() -> Self {
        AppError::Forbidden("Security validation failed. Please try again.".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::LoginRequired => StatusCode::SEE_OTHER,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::Internal(anyhow::anyhow!("session store: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::LoginRequired => Redirect::to("/login").into_response(),
            AppError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred").into_response()
            }
            other => (other.status(), other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(AppError::csrf_rejected().status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("disk on fire")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn login_required_redirects() {
        let response = AppError::LoginRequired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}
