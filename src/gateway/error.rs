//! 网关错误与 HTTP 状态分类
//!
//! 网络失败、非 2xx、JSON 格式错误全部收敛为 `GatewayError`；429 / 402 / 其他 4xx / 5xx 各有分类。

use serde::Serialize;
use thiserror::Error;

/// HTTP 失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusClass {
    RateLimited,
    PaymentRequired,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// 仅对非 2xx 状态有意义；1xx / 3xx 归入 ServerError（托管函数不应返回）
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => StatusClass::RateLimited,
            402 => StatusClass::PaymentRequired,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }
}

/// 网关调用失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("{message}")]
    Http {
        status: u16,
        class: StatusClass,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// 由响应状态与可选 `{ error }` 消息构造；无消息时给出通用文案
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let class = StatusClass::from_status(status);
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message(class, status));
        GatewayError::Http {
            status,
            class,
            message,
        }
    }

    pub fn status_class(&self) -> Option<StatusClass> {
        match self {
            GatewayError::Http { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// 面向用户的消息（不含内部前缀）
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Http { message, .. } => message.clone(),
            GatewayError::Network(_) => {
                "Could not reach the service. Check your connection and try again.".to_string()
            }
            GatewayError::MalformedResponse(_) => {
                "The service returned an unexpected response.".to_string()
            }
        }
    }
}

fn default_message(class: StatusClass, status: u16) -> String {
    match class {
        StatusClass::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
        StatusClass::PaymentRequired => {
            "Payment required. Please add credits to your workspace.".to_string()
        }
        StatusClass::ClientError => format!("Request rejected (HTTP {})", status),
        StatusClass::ServerError => format!("Service error (HTTP {})", status),
    }
}
