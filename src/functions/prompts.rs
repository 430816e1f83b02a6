//! 各动作的系统提示词与上游消息组装

use serde::Deserialize;
use serde_json::Value;

use crate::functions::inference::ChatMessage;
use crate::gateway::ActionName;
use crate::memory::{ConversationTurn, Role};

const MEDICINE_SYSTEM: &str = "You are a medical expert assistant. Analyze medicine images to identify: \
1) Medicine name and brand, 2) Expiry date (check if expired), 3) Batch number, 4) Manufacturing date, \
5) Any visible damage or tampering signs, 6) Authenticity indicators. Be thorough and safety-focused.";

const MEDICINE_USER: &str = "Please analyze this medicine image and provide a detailed safety report. \
Check for expiry date, authenticity, and any red flags.";

const PRESCRIPTION_SYSTEM: &str = "You are a medical transcription assistant. Read handwritten or printed \
prescriptions and transcribe them clearly: patient details, doctor name, date, each medicine with dosage, \
frequency and duration, and any special instructions. Mark anything illegible instead of guessing.";

const PRESCRIPTION_USER: &str = "Please read this prescription and transcribe it in a clear, structured format.";

const FORM_SYSTEM: &str = "You are a document assistant for Indian government services. Extract every \
field from identity documents and forms (name, date of birth, gender, address, document numbers, father's \
or spouse's name) as clean 'Field: Value' lines ready to fill a government form.";

const FORM_USER: &str = "Please extract all the information from this document for form filling.";

const CHAT_SYSTEM: &str = "You are JanSathi, a friendly assistant that helps Indian citizens with health \
questions, government schemes and app settings. Answer simply and briefly, in the user's language.";

/// 请求体无法转换为上游消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    MissingField(&'static str),
}

impl PromptError {
    pub fn message(&self) -> &'static str {
        match self {
            PromptError::MissingField("image") => "Image is required",
            PromptError::MissingField(_) => "Message is required",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatPayload {
    #[serde(default)]
    message: String,
    #[serde(default)]
    conversation_history: Vec<ConversationTurn>,
}

pub fn system_prompt(action: ActionName) -> &'static str {
    match action {
        ActionName::AnalyzeMedicine => MEDICINE_SYSTEM,
        ActionName::ReadPrescription => PRESCRIPTION_SYSTEM,
        ActionName::ExtractFormData => FORM_SYSTEM,
        ActionName::VoiceChat => CHAT_SYSTEM,
    }
}

fn image_instruction(action: ActionName) -> &'static str {
    match action {
        ActionName::ReadPrescription => PRESCRIPTION_USER,
        ActionName::ExtractFormData => FORM_USER,
        _ => MEDICINE_USER,
    }
}

/// 按动作组装上游消息
pub fn build_messages(action: ActionName, payload: &Value) -> Result<Vec<ChatMessage>, PromptError> {
    let system = ChatMessage::system(system_prompt(action));

    if action.takes_image() {
        let image = payload
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(PromptError::MissingField("image"))?;
        return Ok(vec![
            system,
            ChatMessage::user_with_image(image_instruction(action), image),
        ]);
    }

    let chat: ChatPayload =
        serde_json::from_value(payload.clone()).map_err(|_| PromptError::MissingField("message"))?;
    if chat.message.trim().is_empty() {
        return Err(PromptError::MissingField("message"));
    }

    let mut messages = Vec::with_capacity(chat.conversation_history.len() + 2);
    messages.push(system);
    messages.extend(chat.conversation_history.iter().map(|turn| {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        ChatMessage::text(role, turn.content.clone())
    }));
    messages.push(ChatMessage::text("user", chat.message));
    Ok(messages)
}
