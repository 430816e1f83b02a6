//! 提示总线（toast）：进程级、只追加的瞬时提示
//!
//! 应用启动时调用 `init()`；组件持有 `NoticeBus` 句柄发布提示，UI 订阅后自动消失展示。
//! 测试可各自创建独立的总线。

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// 一条瞬时提示
#[derive(Clone, Debug)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// 广播式提示总线；没有订阅者时提示被丢弃
#[derive(Clone, Debug)]
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NoticeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Error => tracing::warn!(notice = %message, "error notice"),
            _ => tracing::debug!(notice = %message, "notice"),
        }
        let _ = self.tx.send(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Error, message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

static GLOBAL: OnceLock<NoticeBus> = OnceLock::new();

/// 初始化进程级总线（幂等），返回其句柄
pub fn init() -> NoticeBus {
    GLOBAL.get_or_init(NoticeBus::default).clone()
}

/// 进程级总线；未显式 init 时按默认容量创建
pub fn global() -> NoticeBus {
    init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = NoticeBus::new(8);
        let mut rx = bus.subscribe();
        bus.success("Medicine analyzed successfully");
        bus.error("Failed to analyze medicine");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, NoticeLevel::Success);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.message, "Failed to analyze medicine");
        assert!(second.at >= first.at);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = NoticeBus::new(1);
        bus.info("nobody listening");
    }

    #[test]
    fn test_global_is_shared() {
        let a = init();
        let mut rx = global().subscribe();
        a.info("hello");
        // 其他测试可能同时向全局总线发布
        assert!(std::iter::from_fn(|| rx.try_recv().ok()).any(|n| n.message == "hello"));
    }
}
