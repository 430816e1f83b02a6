//! 页面会话监管：挂载生命周期
//!
//! 持有 CancellationToken，页面卸载时触发；在途网关调用不会被中断，但其结果到达后若已卸载则直接丢弃。

use tokio_util::sync::CancellationToken;

/// 编排器实例的挂载状态
#[derive(Debug, Clone, Default)]
pub struct SessionSupervisor {
    cancel_token: CancellationToken,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 页面卸载
    pub fn unmount(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_unmounted(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
