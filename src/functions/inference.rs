//! 上游推理客户端：OpenAI 兼容 chat completions
//!
//! 托管函数服务只做适配：拼好消息交给上游，取 `choices[0].message.content`。
//! 429 / 402 单独分类，服务据此返回对应状态码。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FunctionsSection;
use crate::gateway::http::client_with_timeout;

/// 多模态内容片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// 发往上游的一条消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self::text("system", text)
    }

    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// 用户消息：说明文字 + 图片 data URL
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }

    /// 纯文本内容（多模态消息取第一个文字片段）
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(t) => Some(t),
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("{0} is not configured")]
    MissingKey(String),

    #[error("upstream rate limited")]
    RateLimited,

    #[error("upstream requires payment")]
    PaymentRequired,

    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream unreachable: {0}")]
    Transport(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// 推理后端
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// OpenAI 兼容端点客户端
pub struct OpenAiCompatibleClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiCompatibleClient {
    pub fn new(url: &str, model: &str, api_key: Option<String>, timeout_secs: u64) -> Self {
        let client = client_with_timeout(timeout_secs, "inference upstream");
        Self {
            client,
            url: url.to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: "API key".to_string(),
        }
    }

    /// 密钥从 `cfg.api_key_env` 指定的环境变量读取；未设置时每次调用返回 MissingKey
    pub fn from_config(cfg: &FunctionsSection) -> Self {
        let key = std::env::var(&cfg.api_key_env).ok();
        if key.is_none() {
            tracing::warn!(env = %cfg.api_key_env, "upstream API key not set");
        }
        let mut client = Self::new(&cfg.upstream_url, &cfg.model, key, cfg.timeout_secs);
        client.api_key_env = cfg.api_key_env.clone();
        client
    }
}

#[async_trait]
impl InferenceClient for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| InferenceError::MissingKey(self.api_key_env.clone()))?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            429 => return Err(InferenceError::RateLimited),
            402 => return Err(InferenceError::PaymentRequired),
            s if !(200..300).contains(&s) => {
                let body = response.text().await.unwrap_or_default();
                return Err(InferenceError::Upstream { status, body });
            }
            _ => {}
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| InferenceError::Malformed("no choices[0].message.content".to_string()))
    }
}

/// 脚本化推理后端；队列为空时回显最后一条用户文字
#[derive(Debug, Default)]
pub struct MockInference {
    script: Mutex<VecDeque<Result<String, InferenceError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<String, InferenceError>) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(result);
        }
        self
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InferenceClient for MockInference {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        if let Some(scripted) = self.script.lock().ok().and_then(|mut s| s.pop_front()) {
            return scripted;
        }
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .and_then(ChatMessage::text_content)
            .unwrap_or("(no input)");
        Ok(format!("Echo from Mock: {}", last_user))
    }
}
