//! 记忆层：对话记录（单页会话内，不跨刷新保留）

pub mod conversation;

pub use conversation::{ConversationTurn, Role, Transcript};
