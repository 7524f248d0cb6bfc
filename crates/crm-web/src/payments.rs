//! Vendor payment approval, in an unprotected legacy flavour (`/finance`) and
//! a token-protected one (`/approvals`).

use axum::{Form, extract::State, response::Html};
use serde_json::json;
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crm_types::forms::{PaymentAction, PaymentForm};
use crm_types::models::{AuditEntry, Payment};

use crate::error::AppError;
use crate::render::Renderer;
use crate::session::require_user;
use crate::state::{AppState, blocking};
use crate::views;

/// A payment before and after an approval decision.
#[derive(Debug)]
struct Change {
    action: PaymentAction,
    before: Payment,
    after: Payment,
}

/// Parse the form and apply the decision. An unrecognised action changes
/// nothing and yields `Ok(None)`.
async fn apply_decision(state: &AppState, username: &str, form: &PaymentForm) -> Result<Option<Change>, AppError> {
    let id = form
        .parsed_id()
        .ok_or_else(|| AppError::BadRequest("Invalid payment ID".into()))?;
    let Some(action) = PaymentAction::parse(&form.action) else {
        debug!("Ignoring unknown payment action '{}'", form.action);
        return Ok(None);
    };

    let db = state.db.clone();
    let approver = username.to_string();
    let now = state.now();
    let outcome = blocking(move || {
        let Some(before) = db.get_payment(id)? else {
            return Ok(None);
        };
        match action {
            PaymentAction::Approve => db.approve_payment(id, &approver, now)?,
            PaymentAction::Disapprove => db.disapprove_payment(id)?,
        };
        let after = db
            .get_payment(id)?
            .ok_or_else(|| anyhow::anyhow!("payment #{} disappeared during update", id))?;
        Ok(Some((before, after)))
    })
    .await?;

    let Some((before, after)) = outcome else {
        return Err(AppError::NotFound(format!("Payment #{} not found", id)));
    };

    match action {
        PaymentAction::Approve => info!(
            "Payment #{} approved by {} - {} - Notification sent to {}",
            id, username, after.description, after.email
        ),
        PaymentAction::Disapprove => info!(
            "Payment #{} disapproved by {} - {} - Status reset to pending",
            id, username, after.description
        ),
    }

    Ok(Some(Change { action, before, after }))
}

fn audit_entry(username: &str, change: &Change) -> AuditEntry {
    let snapshot = |p: &Payment| json!({ "approved": p.approved, "approved_by": p.approved_by });
    AuditEntry {
        username: Some(username.to_string()),
        action: format!("payment_{}", change.action.as_str()),
        table_name: Some("payments".into()),
        record_id: Some(change.after.id),
        old_values: Some(snapshot(&change.before)),
        new_values: Some(snapshot(&change.after)),
        ..Default::default()
    }
}

async fn list(state: &AppState) -> Result<Vec<Payment>, AppError> {
    let db = state.db.clone();
    blocking(move || db.list_payments()).await
}

// -- Legacy finance system: no anti-forgery check --

pub async fn finance_page(State(state): State<AppState>, session: Session) -> Result<Html<String>, AppError> {
    let username = require_user(&session).await?;
    let payments = list(&state).await?;
    Ok(Html(views::payments(Renderer::RAW, &username, &payments, None)))
}

pub async fn finance_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<Html<String>, AppError> {
    let username = require_user(&session).await?;
    apply_decision(&state, &username, &form).await?;
    let payments = list(&state).await?;
    Ok(Html(views::payments(Renderer::RAW, &username, &payments, None)))
}

// -- Approval system: single-use token required on every POST --

async fn sweep_tokens(state: &AppState) {
    let csrf = state.csrf.clone();
    match blocking(move || csrf.sweep()).await {
        Ok(n) if n > 0 => debug!("Swept {} spent or expired CSRF tokens", n),
        Ok(_) => {}
        Err(e) => warn!("Error cleaning up CSRF tokens: {}", e),
    }
}

async fn render_approvals(state: &AppState, username: &str) -> Result<Html<String>, AppError> {
    let csrf = state.csrf.clone();
    let token = blocking(move || csrf.issue()).await?;
    let payments = list(state).await?;
    Ok(Html(views::payments(
        Renderer::STRUCTURAL,
        username,
        &payments,
        Some(&token),
    )))
}

pub async fn approvals_page(State(state): State<AppState>, session: Session) -> Result<Html<String>, AppError> {
    let username = require_user(&session).await?;
    sweep_tokens(&state).await;
    render_approvals(&state, &username).await
}

pub async fn approvals_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<Html<String>, AppError> {
    let username = require_user(&session).await?;
    sweep_tokens(&state).await;

    let csrf = state.csrf.clone();
    let presented = form.csrf_token.clone().unwrap_or_default();
    if !blocking(move || csrf.validate(&presented)).await? {
        warn!("Rejected payment decision from '{}': invalid CSRF token", username);
        return Err(AppError::csrf_rejected());
    }

    if let Some(change) = apply_decision(&state, &username, &form).await? {
        let db = state.db.clone();
        let entry = audit_entry(&username, &change);
        let now = state.now();
        if let Err(e) = blocking(move || db.record_audit(&entry, now)).await {
            warn!("Failed to write audit entry: {}", e);
        }
    }

    render_approvals(&state, &username).await
}
