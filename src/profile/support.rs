//! 帮助与支持：常见问题与支持请求
//!
//! 支持请求只在本地校验后确认，不经过网关。

use std::sync::OnceLock;

use regex::Regex;

use crate::core::{AppError, NoticeBus};

/// 常见问题（问题，回答）
pub const FAQS: [(&str, &str); 5] = [
    (
        "How do I scan medicines?",
        "Go to Health section and select Medicine Scanner. Point your camera at the medicine label and our AI will extract all relevant information.",
    ),
    (
        "How do I read prescriptions?",
        "Navigate to Health > Prescription Reader. Upload or capture a photo of your prescription, and our system will digitize it for you.",
    ),
    (
        "How do I fill government forms?",
        "Use the G-Assist section and select Photo to Form. Take a photo of any document, and we'll help you auto-fill government forms.",
    ),
    (
        "How do I change language?",
        "Go to your Profile > Language Preferences to select your preferred language for the app interface and voice assistance.",
    ),
    (
        "How do I enable notifications?",
        "Visit Profile > Notifications to manage alerts for medications, appointments, and government updates.",
    ),
];

pub const SUPPORT_EMAIL: &str = "support@app.com";
pub const SUPPORT_PHONE: &str = "1800-123-4567";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

/// 支持请求表单
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl SupportRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if !email_re().is_match(self.email.trim()) {
            return Err(AppError::Validation("A valid email is required".into()));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("Message is required".into()));
        }
        Ok(())
    }
}

/// 校验并确认支持请求；校验失败以提示形式告知
pub fn submit_support_request(request: &SupportRequest, notices: &NoticeBus) -> Result<(), AppError> {
    if let Err(e) = request.validate() {
        notices.error(e.user_message());
        return Err(e);
    }
    tracing::info!(email = %request.email.trim(), "support request submitted");
    notices.success("Support request submitted successfully!");
    Ok(())
}
