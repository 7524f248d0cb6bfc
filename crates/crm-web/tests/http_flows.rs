//! End-to-end request flows against an in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{TimeZone, Utc};
use crm_db::{Clock, CsrfTokens, Database, ManualClock, SystemClock};
use crm_web::AppStateInner;
use http_body_util::BodyExt;
use tower::ServiceExt;

fn spawn_app() -> (Arc<Database>, Router) {
    spawn_app_with_clock(Arc::new(SystemClock))
}

fn spawn_app_with_clock(clock: Arc<dyn Clock>) -> (Arc<Database>, Router) {
    let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
    let csrf = CsrfTokens::new(db.clone(), clock);
    let app = crm_web::router(AppStateInner::new(db.clone(), csrf));
    (db, app)
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sign in as `admin` and return the `name=value` session cookie.
async fn sign_in(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_form("/login", None, "username=admin&password=GlobalAdmin2024"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("session-name="));
    cookie
}

fn extract_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page carries a csrf_token field") + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

async fn fresh_token(app: &Router, cookie: &str) -> String {
    let response = app.clone().oneshot(get("/approvals", Some(cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_token(&body_text(response).await)
}

fn is_approved(db: &Database, id: i64) -> bool {
    db.get_payment(id).unwrap().unwrap().approved
}

#[tokio::test]
async fn protected_pages_redirect_when_signed_out() {
    let (_, app) = spawn_app();

    for uri in ["/dashboard", "/feedback", "/feedback-secure", "/finance", "/approvals"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers()[header::LOCATION], "/login", "{uri}");
    }
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_injection() {
    let (_, app) = spawn_app();

    let response = app
        .clone()
        .oneshot(post_form("/login", None, "username=admin&password=wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Invalid credentials");

    // admin' OR '1'='1' --
    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            None,
            "username=admin%27+OR+%271%27%3D%271%27+--&password=x",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn legacy_login_is_injectable_and_leaks_errors() {
    let (_, app) = spawn_app();

    // admin' --
    let response = app
        .clone()
        .oneshot(post_form("/auth", None, "username=admin%27+--&password=anything"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    assert!(body_text(response).await.contains("admin@globomantics.com"));

    // o'brien
    let response = app
        .clone()
        .oneshot(post_form("/auth", None, "username=o%27brien&password=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.starts_with("Login failed: "));
}

#[tokio::test]
async fn signed_in_home_goes_to_dashboard() {
    let (_, app) = spawn_app();
    let cookie = sign_in(&app).await;

    let response = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");

    let response = app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Welcome back, admin!"));
    assert!(html.contains("Alice Johnson"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let (_, app) = spawn_app();
    let cookie = sign_in(&app).await;

    let response = app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let response = app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn approvals_require_a_fresh_token() {
    let (db, app) = spawn_app();
    let cookie = sign_in(&app).await;

    // No token.
    let response = app
        .clone()
        .oneshot(post_form("/approvals", Some(&cookie), "payment_id=1&action=approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(response).await,
        "Security validation failed. Please try again."
    );
    assert!(!is_approved(&db, 1));

    // Fresh token.
    let token = fresh_token(&app, &cookie).await;
    let body = format!("payment_id=1&action=approve&csrf_token={token}");
    let response = app
        .clone()
        .oneshot(post_form("/approvals", Some(&cookie), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert_ne!(extract_token(&page), token);
    assert!(is_approved(&db, 1));
    assert_eq!(db.get_payment(1).unwrap().unwrap().approved_by.as_deref(), Some("admin"));

    let audit = db.recent_audit(5).unwrap();
    assert_eq!(audit[0].action, "payment_approve");
    assert_eq!(audit[0].record_id, Some(1));

    // Replay of the same token on another payment.
    let body = format!("payment_id=2&action=approve&csrf_token={token}");
    let response = app
        .clone()
        .oneshot(post_form("/approvals", Some(&cookie), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!is_approved(&db, 2));
}

#[tokio::test]
async fn approvals_validate_token_before_anything_else() {
    let (db, app) = spawn_app();
    let cookie = sign_in(&app).await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/approvals",
            Some(&cookie),
            "payment_id=abc&action=approve&csrf_token=forged",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = fresh_token(&app, &cookie).await;
    let body = format!("payment_id=abc&action=approve&csrf_token={token}");
    let response = app
        .clone()
        .oneshot(post_form("/approvals", Some(&cookie), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid payment ID");

    let token = fresh_token(&app, &cookie).await;
    let body = format!("payment_id=404&action=approve&csrf_token={token}");
    let response = app
        .clone()
        .oneshot(post_form("/approvals", Some(&cookie), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(db.recent_audit(5).unwrap().is_empty());
}

#[tokio::test]
async fn finance_accepts_forged_posts() {
    let (db, app) = spawn_app();
    let cookie = sign_in(&app).await;

    let response = app
        .clone()
        .oneshot(post_form("/finance", Some(&cookie), "payment_id=1&action=approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(is_approved(&db, 1));
    assert!(!body_text(response).await.contains("csrf_token"));

    let response = app
        .clone()
        .oneshot(post_form("/finance", Some(&cookie), "payment_id=1&action=disapprove"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!is_approved(&db, 1));

    let response = app
        .clone()
        .oneshot(post_form("/finance", Some(&cookie), "payment_id=1&action=delete"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!is_approved(&db, 1));

    let response = app
        .clone()
        .oneshot(post_form("/finance", Some(&cookie), "payment_id=one&action=approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feedback_escaping_depends_on_route() {
    let (_, app) = spawn_app();
    let cookie = sign_in(&app).await;
    let payload = "username=Mallory&content=%3Cscript%3Ealert(1)%3C%2Fscript%3E";

    let response = app
        .clone()
        .oneshot(post_form("/feedback", Some(&cookie), payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<script>alert(1)</script>"));

    let response = app.clone().oneshot(get("/feedback-secure", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert_eq!(headers["x-xss-protection"], "1; mode=block");

    let html = body_text(response).await;
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
}

#[tokio::test]
async fn approvals_page_fails_closed_when_tokens_cannot_be_stored() {
    let (db, app) = spawn_app();
    let cookie = sign_in(&app).await;

    db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE csrf_tokens")?;
        Ok(())
    })
    .unwrap();

    let response = app.clone().oneshot(get("/approvals", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(!body.contains("csrf_token"));
    assert_eq!(body, "An internal error occurred");
}

#[tokio::test]
async fn decisions_are_stamped_with_the_app_clock() {
    let now = Utc.with_ymd_and_hms(2031, 1, 31, 23, 30, 0).unwrap();
    let (db, app) = spawn_app_with_clock(Arc::new(ManualClock::new(now)));
    let cookie = sign_in(&app).await;

    let token = fresh_token(&app, &cookie).await;
    let body = format!("payment_id=2&action=approve&csrf_token={token}");
    let response = app
        .clone()
        .oneshot(post_form("/approvals", Some(&cookie), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(db.get_payment(2).unwrap().unwrap().approved_at, Some(now));
    let stats = db.dashboard_stats(now).unwrap();
    assert!((stats.monthly_revenue - 8250.5).abs() < 1e-6);
}
