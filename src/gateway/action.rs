//! 远程动作定义：动作名、请求载荷、成功结果
//!
//! 动作集合固定；网关返回的 JSON 在边界处立即解码为 `ActionOutput`，不向内传递无类型值。

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::gateway::GatewayError;
use crate::memory::ConversationTurn;

/// 托管函数动作名（线上名称为 kebab-case）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionName {
    AnalyzeMedicine,
    ReadPrescription,
    ExtractFormData,
    VoiceChat,
}

impl ActionName {
    pub const ALL: [ActionName; 4] = [
        ActionName::AnalyzeMedicine,
        ActionName::ReadPrescription,
        ActionName::ExtractFormData,
        ActionName::VoiceChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::AnalyzeMedicine => "analyze-medicine",
            ActionName::ReadPrescription => "read-prescription",
            ActionName::ExtractFormData => "extract-form-data",
            ActionName::VoiceChat => "voice-chat",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// 成功响应中承载结果的字段名
    pub fn success_field(&self) -> &'static str {
        match self {
            ActionName::AnalyzeMedicine => "analysis",
            ActionName::ReadPrescription => "prescriptionText",
            ActionName::ExtractFormData => "extractedData",
            ActionName::VoiceChat => "reply",
        }
    }

    /// 是否为图片类动作（请求体为 `{ image }`）
    pub fn takes_image(&self) -> bool {
        !matches!(self, ActionName::VoiceChat)
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次远程动作请求：动作名 + JSON 对象载荷
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteActionRequest {
    pub action: ActionName,
    pub payload: Value,
}

impl RemoteActionRequest {
    /// 图片类动作：`{ "image": "<data-url>" }`
    pub fn image(action: ActionName, data_url: impl Into<String>) -> Self {
        Self {
            action,
            payload: json!({ "image": data_url.into() }),
        }
    }

    /// 对话动作：`{ "message", "conversationHistory" }`，history 为本轮用户消息之前的全部轮次
    pub fn chat(message: impl Into<String>, history: &[ConversationTurn]) -> Self {
        Self {
            action: ActionName::VoiceChat,
            payload: json!({
                "message": message.into(),
                "conversationHistory": history,
            }),
        }
    }
}

/// 已解码的成功结果，按动作区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutput {
    Analysis(String),
    PrescriptionText(String),
    ExtractedData(String),
    Reply(String),
}

impl ActionOutput {
    /// 从成功响应体解码；字段缺失或类型不符视为响应格式错误
    pub fn decode(action: ActionName, body: &Value) -> Result<Self, GatewayError> {
        let field = action.success_field();
        let text = body
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GatewayError::MalformedResponse(format!(
                    "{} response is missing string field '{}'",
                    action, field
                ))
            })?
            .to_string();

        Ok(Self::new(action, text))
    }

    pub fn new(action: ActionName, text: impl Into<String>) -> Self {
        let text = text.into();
        match action {
            ActionName::AnalyzeMedicine => ActionOutput::Analysis(text),
            ActionName::ReadPrescription => ActionOutput::PrescriptionText(text),
            ActionName::ExtractFormData => ActionOutput::ExtractedData(text),
            ActionName::VoiceChat => ActionOutput::Reply(text),
        }
    }

    pub fn action(&self) -> ActionName {
        match self {
            ActionOutput::Analysis(_) => ActionName::AnalyzeMedicine,
            ActionOutput::PrescriptionText(_) => ActionName::ReadPrescription,
            ActionOutput::ExtractedData(_) => ActionName::ExtractFormData,
            ActionOutput::Reply(_) => ActionName::VoiceChat,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ActionOutput::Analysis(t)
            | ActionOutput::PrescriptionText(t)
            | ActionOutput::ExtractedData(t)
            | ActionOutput::Reply(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ActionOutput::Analysis(t)
            | ActionOutput::PrescriptionText(t)
            | ActionOutput::ExtractedData(t)
            | ActionOutput::Reply(t) => t,
        }
    }

    /// 以线上格式重新编码（Mock 与托管函数服务共用）
    pub fn to_body(&self) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.action().success_field().to_string(),
            Value::String(self.text().to_string()),
        );
        Value::Object(body)
    }
}

/// 网关调用结果
pub type RemoteActionResult = Result<ActionOutput, GatewayError>;
