//! HTTP 托管函数网关
//!
//! POST `{base_url}/functions/v1/{action}`，JSON 请求体；成功时按动作解码结果字段，
//! 失败时读取 `{ error }` 并按状态码分类。超时由配置决定。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::GatewaySection;
use crate::gateway::{
    ActionGateway, ActionOutput, GatewayError, RemoteActionRequest, RemoteActionResult,
};

/// 构建带超时的 reqwest 客户端；构建失败时退回默认客户端（无超时）并告警
pub(crate) fn client_with_timeout(timeout_secs: u64, purpose: &str) -> Client {
    client_or_default(
        Client::builder().timeout(Duration::from_secs(timeout_secs)),
        purpose,
    )
}

fn client_or_default(builder: reqwest::ClientBuilder, purpose: &str) -> Client {
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(purpose, "http client build failed, using default client without timeout: {}", e);
        Client::default()
    })
}

/// 基于 reqwest 的网关实现
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    /// 已登录用户的 access token；未设置时用 anon key 作为 Bearer
    access_token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Self {
        let client = client_with_timeout(timeout_secs, "action gateway");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
        }
    }

    pub fn from_config(cfg: &GatewaySection) -> Self {
        Self::new(&cfg.base_url, &cfg.anon_key, cfg.timeout_secs)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint(&self, request: &RemoteActionRequest) -> String {
        format!("{}/functions/v1/{}", self.base_url, request.action)
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}

/// 将 HTTP 响应（状态 + 原始文本）转换为动作结果；与传输层解耦便于单测
pub(crate) fn interpret_response(
    request: &RemoteActionRequest,
    status: u16,
    body: &str,
) -> RemoteActionResult {
    let parsed: Result<Value, _> = serde_json::from_str(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from));
        return Err(GatewayError::from_status(status, message));
    }

    let value = parsed.map_err(|e| {
        GatewayError::MalformedResponse(format!("{} returned invalid JSON: {}", request.action, e))
    })?;
    ActionOutput::decode(request.action, &value)
}

#[async_trait]
impl ActionGateway for HttpGateway {
    async fn invoke(&self, request: RemoteActionRequest) -> RemoteActionResult {
        let url = self.endpoint(&request);
        tracing::info!(action = %request.action, "invoking remote action");

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .json(&request.payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(action = %request.action, "request failed: {}", e);
                GatewayError::Network(e.to_string())
            })?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Network(format!("Read body: {}", e)))?;

        let result = interpret_response(&request, status, &body);
        match &result {
            Ok(_) => tracing::info!(action = %request.action, status, "remote action complete"),
            Err(e) => tracing::warn!(action = %request.action, status, "remote action failed: {}", e),
        }
        result
    }
}
