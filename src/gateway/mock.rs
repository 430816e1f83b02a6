//! Mock 网关（用于测试与离线演示，无需网络）
//!
//! 按顺序回放预置结果；队列为空时回显输入（对话回显用户消息，图片动作返回固定报告）。
//! 记录每次请求，并可把调用挂起直到 `release`，便于观察 Pending 状态。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::gateway::{
    ActionGateway, ActionName, ActionOutput, GatewayError, RemoteActionRequest, RemoteActionResult,
};

/// Mock 网关：脚本化结果 + 调用记录 + 可选挂起
#[derive(Debug)]
pub struct MockGateway {
    script: Mutex<VecDeque<RemoteActionResult>>,
    calls: Mutex<Vec<RemoteActionRequest>>,
    held_tx: watch::Sender<bool>,
    count_tx: watch::Sender<usize>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        let (held_tx, _) = watch::channel(false);
        let (count_tx, _) = watch::channel(0usize);
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            held_tx,
            count_tx,
        }
    }

    /// 追加一个预置结果（先进先出）
    pub fn push(&self, result: RemoteActionResult) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(result);
        }
        self
    }

    pub fn push_ok(&self, output: ActionOutput) -> &Self {
        self.push(Ok(output))
    }

    pub fn push_err(&self, err: GatewayError) -> &Self {
        self.push(Err(err))
    }

    /// 之后的调用在返回前等待 `release`
    pub fn hold(&self) {
        self.held_tx.send_replace(true);
    }

    pub fn release(&self) {
        self.held_tx.send_replace(false);
    }

    pub fn calls(&self) -> Vec<RemoteActionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        *self.count_tx.borrow()
    }

    /// 等待累计调用数达到 n（调用进入网关即计数，不等结果）
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.count_tx.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    fn echo(request: &RemoteActionRequest) -> ActionOutput {
        match request.action {
            ActionName::VoiceChat => {
                let message = request
                    .payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("(no input)");
                ActionOutput::Reply(format!("Echo from Mock: {}", message))
            }
            ActionName::AnalyzeMedicine => ActionOutput::Analysis("Mock analysis report".into()),
            ActionName::ReadPrescription => {
                ActionOutput::PrescriptionText("Mock prescription text".into())
            }
            ActionName::ExtractFormData => ActionOutput::ExtractedData("Mock extracted data".into()),
        }
    }
}

#[async_trait]
impl ActionGateway for MockGateway {
    async fn invoke(&self, request: RemoteActionRequest) -> RemoteActionResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        self.count_tx.send_modify(|c| *c += 1);

        let mut held = self.held_tx.subscribe();
        let _ = held.wait_for(|h| !*h).await;

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| Ok(Self::echo(&request)))
    }
}
