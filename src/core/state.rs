//! 视图状态：每个编排器实例同一时刻只有一个活动状态
//!
//! Idle → Pending → Success | Error；迁移只由用户动作（submit / clear）或网关响应触发。

use serde::Serialize;

/// 编排器视图状态
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "value", rename_all = "snake_case")]
pub enum ViewState<T> {
    Idle,
    Pending,
    Success(T),
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

/// 不带载荷的阶段（便于比较与日志）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViewPhase {
    Idle,
    Pending,
    Success,
    Error,
}

impl<T> ViewState<T> {
    pub fn phase(&self) -> ViewPhase {
        match self {
            ViewState::Idle => ViewPhase::Idle,
            ViewState::Pending => ViewPhase::Pending,
            ViewState::Success(_) => ViewPhase::Success,
            ViewState::Error(_) => ViewPhase::Error,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ViewState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ViewState::Pending)
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            ViewState::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let s: ViewState<String> = ViewState::Success("Report X".into());
        assert_eq!(s.phase(), ViewPhase::Success);
        assert_eq!(s.result().map(String::as_str), Some("Report X"));
        assert_eq!(s.error(), None);

        let e: ViewState<String> = ViewState::Error("offline".into());
        assert_eq!(e.error(), Some("offline"));
        assert!(ViewState::<String>::default().is_idle());
    }

    #[test]
    fn test_serialized_shape() {
        let s: ViewState<String> = ViewState::Success("ok".into());
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            serde_json::json!({ "phase": "success", "value": "ok" })
        );
        assert_eq!(
            serde_json::to_value(ViewState::<String>::Pending).unwrap(),
            serde_json::json!({ "phase": "pending" })
        );
    }
}
