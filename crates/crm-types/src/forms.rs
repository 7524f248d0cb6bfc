use serde::Deserialize;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Feedback --

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
}

// -- Payments --

/// Approval form. `payment_id` stays a string so a non-numeric value can be
/// reported as a bad request instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub payment_id: String,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    Approve,
    Disapprove,
}

impl PaymentAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "approve" => Some(Self::Approve),
            "disapprove" => Some(Self::Disapprove),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Disapprove => "disapprove",
        }
    }
}

impl PaymentForm {
    pub fn parsed_id(&self) -> Option<i64> {
        self.payment_id.trim().parse().ok()
    }
}
