//! 远程动作网关抽象
//!
//! 所有后端（HTTP 托管函数 / Mock）实现 ActionGateway：一次调用恰好一次网络往返，不自动重试。

use async_trait::async_trait;

use crate::gateway::{RemoteActionRequest, RemoteActionResult};

/// 远程动作网关：提交动作，返回已解码结果或分类后的错误
///
/// 实现方不得修改调用方状态，状态迁移由编排器负责。
#[async_trait]
pub trait ActionGateway: Send + Sync {
    async fn invoke(&self, request: RemoteActionRequest) -> RemoteActionResult;
}
