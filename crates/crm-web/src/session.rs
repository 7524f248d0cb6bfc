//! Authentication state kept in the cookie session.

use time::Duration;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, cookie::SameSite};

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session-name";
const AUTHENTICATED_KEY: &str = "authenticated";
const USERNAME_KEY: &str = "username";

/// Cookie-backed session layer. Ports do not separate sites, so a page served
/// from another localhost port still gets this cookie attached.
pub fn layer() -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)))
}

/// Username of the signed-in user, if any.
pub async fn current_user(session: &Session) -> Result<Option<String>, AppError> {
    let authenticated = session.get::<bool>(AUTHENTICATED_KEY).await?.unwrap_or(false);
    if !authenticated {
        return Ok(None);
    }
    let username = session.get::<String>(USERNAME_KEY).await?;
    Ok(Some(username.filter(|u| !u.is_empty()).unwrap_or_else(|| "User".to_string())))
}

/// Like [`current_user`] but turns "signed out" into a redirect to the login page.
pub async fn require_user(session: &Session) -> Result<String, AppError> {
    current_user(session).await?.ok_or(AppError::LoginRequired)
}

pub async fn sign_in(session: &Session, username: &str) -> Result<(), AppError> {
    session.insert(AUTHENTICATED_KEY, true).await?;
    session.insert(USERNAME_KEY, username).await?;
    Ok(())
}

pub async fn sign_out(session: &Session) -> Result<(), AppError> {
    session.insert(AUTHENTICATED_KEY, false).await?;
    session.remove::<String>(USERNAME_KEY).await?;
    Ok(())
}
