//! Page markup. User data is only ever substituted through a [`Renderer`].

use std::fmt::Write as _;

use crm_types::models::{Activity, Comment, Customer, DashboardStats, Payment, User};

use crate::render::{Escaping, Renderer};

const STYLE: &str = r#"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; background: #f8f9fa; color: #333; }
.header { background: white; padding: 20px 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); margin-bottom: 30px; }
.header-content { max-width: 1200px; margin: 0 auto; padding: 0 20px; display: flex; align-items: center; justify-content: space-between; }
.header-content a { color: #007bff; text-decoration: none; margin-left: 20px; }
.logo { font-size: 20px; font-weight: bold; }
.container { max-width: 900px; margin: 0 auto; padding: 0 20px 40px; }
.card { background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); margin-bottom: 20px; }
.form-group { margin-bottom: 20px; }
label { display: block; margin-bottom: 8px; font-weight: 500; }
input, textarea { width: 100%; padding: 12px; border: 1px solid #ddd; border-radius: 4px; font-size: 16px; box-sizing: border-box; }
textarea { min-height: 100px; resize: vertical; }
button { background: #007bff; color: white; padding: 12px 30px; border: none; border-radius: 4px; font-size: 16px; cursor: pointer; }
.notice { background: #fff3cd; border: 1px solid #ffeaa7; color: #856404; padding: 15px; border-radius: 4px; margin-bottom: 20px; }
.secure { background: #d4edda; border: 1px solid #c3e6cb; color: #155724; padding: 15px; border-radius: 4px; margin-bottom: 20px; }
.item { background: white; padding: 20px; margin-bottom: 15px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); border-left: 4px solid #007bff; }
.item.approved { border-left-color: #28a745; }
.item.pending { border-left-color: #ffc107; }
.timestamp { color: #666; font-size: 14px; }
.stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 15px; margin-bottom: 20px; }
.stat { background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
.stat .value { font-size: 24px; font-weight: bold; }
.token { font-family: monospace; font-size: 12px; word-break: break-all; }
.disapprove { background: #dc3545; }
"#;

fn page(title: &str, signed_in: bool, body: &str) -> String {
    let nav = if signed_in {
        r#"<a href="/dashboard">Dashboard</a><a href="/logout">Logout</a>"#
    } else {
        r#"<a href="/login">Employee Login</a>"#
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title} - Globomantics CRM</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="header">
        <div class="header-content">
            <div class="logo">Globomantics CRM</div>
            <div>{nav}</div>
        </div>
    </div>
    <div class="container">
{body}
    </div>
</body>
</html>"#
    )
}

fn display_time(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%B %-d, %Y at %-I:%M %p").to_string()
}

// -- Home --

pub fn home() -> String {
    page(
        "Welcome",
        false,
        r#"        <div class="card">
            <h1>Globomantics CRM</h1>
            <p>Customer relationships, vendor payments and team feedback in one place.</p>
            <p><a href="/login">Employee portal</a> | <a href="/auth">Legacy authentication system</a></p>
        </div>"#,
    )
}

// -- Login --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginVariant {
    Portal,
    Legacy,
}

pub fn login(variant: LoginVariant) -> String {
    let (title, notice, button, alt) = match variant {
        LoginVariant::Portal => (
            "Employee Portal",
            "",
            "Sign In",
            r#"<a href="/auth">Legacy System</a>"#,
        ),
        LoginVariant::Legacy => (
            "Legacy Authentication System",
            r#"<div class="notice"><strong>Notice:</strong> This is our legacy authentication system.
                For improved security, please use the <a href="/login">new login portal</a>.</div>"#,
            "Access Legacy System",
            r#"<a href="/login">Try the new system</a>"#,
        ),
    };

    let body = format!(
        r#"        <div class="card">
            <h2>{title}</h2>
            {notice}
            <form method="post">
                <div class="form-group">
                    <label>Employee ID:</label>
                    <input type="text" name="username" placeholder="Enter your employee ID" required>
                </div>
                <div class="form-group">
                    <label>Password:</label>
                    <input type="password" name="password" placeholder="Enter your password" required>
                </div>
                <button type="submit">{button}</button>
            </form>
            <p class="timestamp">Having trouble? {alt}</p>
        </div>"#
    );
    page(title, false, &body)
}

pub fn legacy_login_success(r: Renderer, user: &User) -> String {
    let body = format!(
        r#"        <div class="secure">
            <h2>Authentication Successful</h2>
            <p>Welcome to the legacy system</p>
        </div>
        <div class="card">
            <h3>Employee Information</h3>
            <p><strong>Employee ID:</strong> {}</p>
            <p><strong>Email:</strong> {}</p>
            <p><strong>System:</strong> Legacy Authentication Portal</p>
        </div>
        <p><a href="/dashboard">Go to Dashboard</a> | <a href="/logout">Logout</a> | <a href="/auth">Back to Legacy Login</a></p>"#,
        r.text(&user.username),
        r.text(&user.email),
    );
    page("Access Granted", true, &body)
}

// -- Dashboard --

pub fn dashboard(
    r: Renderer,
    username: &str,
    stats: &DashboardStats,
    activities: &[Activity],
    customers: &[Customer],
) -> String {
    let mut body = format!(
        r#"        <div class="card">
            <h1>Welcome back, {username}!</h1>
            <p>Here's what's happening with your customer relationships today.</p>
        </div>
        <div class="stats">
            <div class="stat"><div class="value">{active}</div>Active customers</div>
            <div class="stat"><div class="value">{pending}</div>Pending payments</div>
            <div class="stat"><div class="value">${pending_amount:.2}</div>Awaiting approval</div>
            <div class="stat"><div class="value">${revenue:.2}</div>Approved this month</div>
            <div class="stat"><div class="value">{comments}</div>Feedback this month</div>
        </div>
        <div class="card">
            <h3>Workspaces</h3>
            <p><a href="/approvals">Payment approvals</a> | <a href="/finance">Legacy finance system</a></p>
            <p><a href="/feedback-secure">Customer feedback</a> | <a href="/feedback">Customer feedback (legacy)</a></p>
        </div>
"#,
        username = r.text(username),
        active = stats.active_customers,
        pending = stats.pending_payments,
        pending_amount = stats.pending_amount,
        revenue = stats.monthly_revenue,
        comments = stats.monthly_comments,
    );

    body.push_str("        <div class=\"card\">\n            <h3>Recent activity</h3>\n");
    for activity in activities {
        let _ = writeln!(
            body,
            r#"            <div class="item"><strong>{}</strong> ({}) <span class="timestamp">{}</span><div>{}</div></div>"#,
            r.text(&activity.subject),
            r.text(&activity.kind),
            display_time(&activity.created_at),
            r.text(activity.notes.as_deref().unwrap_or("")),
        );
    }
    body.push_str("        </div>\n        <div class=\"card\">\n            <h3>Customers</h3>\n");
    for customer in customers {
        let _ = writeln!(
            body,
            r#"            <div class="item"><strong>{}</strong> - {} <span class="timestamp">{} · {}</span></div>"#,
            r.text(&customer.full_name()),
            r.text(customer.company.as_deref().unwrap_or("")),
            r.text(&customer.email),
            r.text(&customer.status),
        );
    }
    body.push_str("        </div>");

    page("Dashboard", true, &body)
}

// -- Feedback --

pub fn feedback(r: Renderer, comments: &[Comment]) -> String {
    let (title, banner) = match r.escaping() {
        Escaping::Raw => ("Customer Feedback Portal", ""),
        Escaping::Structural => (
            "Secure Customer Feedback Portal",
            r#"        <div class="secure"><strong>Security Enhanced:</strong> This feedback system escapes
            user input before display to prevent XSS attacks.</div>
"#,
        ),
    };

    let mut body = format!(
        r#"        <h2>{title}</h2>
{banner}        <div class="card">
            <h3>Submit New Feedback</h3>
            <form method="post">
                <div class="form-group">
                    <label>Customer Name:</label>
                    <input type="text" name="username" placeholder="Enter customer name" required>
                </div>
                <div class="form-group">
                    <label>Feedback:</label>
                    <textarea name="content" placeholder="Enter customer feedback..." required></textarea>
                </div>
                <button type="submit">Submit Feedback</button>
            </form>
        </div>
        <h3>Recent Customer Feedback:</h3>
"#
    );

    for comment in comments {
        let _ = writeln!(
            body,
            r#"        <div class="item">
            <div><strong>{}</strong></div>
            <div class="timestamp">{}</div>
            <div style="margin-top: 10px;">{}</div>
        </div>"#,
            r.text(&comment.username),
            display_time(&comment.created),
            r.text(&comment.content),
        );
    }

    page(title, true, &body)
}

// -- Payments --

/// `csrf_token` is `Some` on the protected approval screen and `None` on the
/// legacy finance screen, whose forms carry no token.
pub fn payments(r: Renderer, username: &str, payments: &[Payment], csrf_token: Option<&str>) -> String {
    let (title, banner) = match csrf_token {
        None => (
            "Legacy Finance System",
            r#"<div class="notice"><strong>Notice:</strong> This is our legacy finance system.
            For enhanced security features, please use the <a href="/approvals">new approval system</a>.</div>"#
                .to_string(),
        ),
        Some(token) => (
            "Payment Approval System",
            format!(
                r#"<div class="secure"><strong>Secure System:</strong> Each request includes validation token:
            <span class="token">{}</span></div>"#,
                r.text(token)
            ),
        ),
    };
    let hidden_token = csrf_token
        .map(|t| format!(r#"<input type="hidden" name="csrf_token" value="{}">"#, r.attr(t)))
        .unwrap_or_default();

    let mut body = format!(
        r#"        <h2>{title}</h2>
        <p>Welcome, <strong>{}</strong>!</p>
        {banner}
        <h3>Vendor Payments:</h3>
"#,
        r.text(username)
    );

    for payment in payments {
        let (class, status, action, label, button_class) = if payment.approved {
            ("approved", "Approved", "disapprove", "Disapprove Payment", "disapprove")
        } else {
            ("pending", "Pending Approval", "approve", "Approve Payment", "")
        };
        let approver = payment
            .approved_by
            .as_deref()
            .map(|by| format!(" by {}", r.text(by)))
            .unwrap_or_default();

        let _ = writeln!(
            body,
            r#"        <div class="item {class}">
            <div><strong>Payment #{id} - ${amount:.2}</strong></div>
            <div>Vendor: {email}</div>
            <div class="timestamp">{description}</div>
            <div>{status}{approver}</div>
            <form method="post" style="margin-top: 15px;">
                <input type="hidden" name="payment_id" value="{id}">
                <input type="hidden" name="action" value="{action}">
                {hidden_token}
                <button type="submit" class="{button_class}">{label}</button>
            </form>
        </div>"#,
            id = payment.id,
            amount = payment.amount,
            email = r.text(&payment.email),
            description = r.text(&payment.description),
        );
    }

    page(title, true, &body)
}
