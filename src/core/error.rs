//! 应用错误类型与呈现方式
//!
//! 各层错误（网关 / 媒体 / 资料）统一为 AppError；所有错误都在编排器边界被捕获，
//! 转为瞬时提示或 Error 视图状态，不会逃逸为未处理失败。

use thiserror::Error;

use crate::gateway::{GatewayError, StatusClass};
use crate::media::MediaError;
use crate::profile::ProfileError;

/// 编排核心可能出现的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// 本地输入为空或无效，不会触达网络
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// 错误分类（与用户可见行为对应）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PermissionDenied,
    RateLimited,
    PaymentRequired,
    ClientError,
    ServerError,
    Network,
    MalformedResponse,
    UnsupportedMedia,
    Busy,
    CaptureFailed,
    SpeechUnsupported,
    PlaybackError,
    Unauthenticated,
}

/// 错误呈现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// 非阻塞、自动消失的提示
    Notice,
    /// 写入编排器的 Error 状态，直到清除或被新提交覆盖
    ViewState,
}

fn gateway_kind(err: &GatewayError) -> ErrorKind {
    match err {
        GatewayError::Http { class, .. } => match class {
            StatusClass::RateLimited => ErrorKind::RateLimited,
            StatusClass::PaymentRequired => ErrorKind::PaymentRequired,
            StatusClass::ClientError => ErrorKind::ClientError,
            StatusClass::ServerError => ErrorKind::ServerError,
        },
        GatewayError::Network(_) => ErrorKind::Network,
        GatewayError::MalformedResponse(_) => ErrorKind::MalformedResponse,
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Gateway(e) => gateway_kind(e),
            AppError::Media(e) => match e {
                MediaError::UnsupportedMedia(_) => ErrorKind::UnsupportedMedia,
                MediaError::PermissionDenied(_) => ErrorKind::PermissionDenied,
                MediaError::CaptureBusy | MediaError::SpeechBusy => ErrorKind::Busy,
                MediaError::CaptureFailed(_) => ErrorKind::CaptureFailed,
                MediaError::SpeechUnsupported => ErrorKind::SpeechUnsupported,
                MediaError::PlaybackError(_) => ErrorKind::PlaybackError,
                MediaError::EmptyText => ErrorKind::Validation,
            },
            AppError::Profile(e) => match e {
                ProfileError::Unauthenticated => ErrorKind::Unauthenticated,
                ProfileError::Remote(remote) => gateway_kind(remote),
                ProfileError::Malformed(_) => ErrorKind::MalformedResponse,
                ProfileError::DialogClosed => ErrorKind::Validation,
            },
        }
    }

    /// 网关失败进入视图状态；其余只作提示
    pub fn surface(&self) -> Surface {
        match self {
            AppError::Gateway(_) => Surface::ViewState,
            _ => Surface::Notice,
        }
    }

    /// 面向用户的文案
    pub fn user_message(&self) -> String {
        match self {
            AppError::Gateway(e) => e.user_message(),
            AppError::Profile(ProfileError::Remote(e)) => e.user_message(),
            other => other.to_string(),
        }
    }
}
