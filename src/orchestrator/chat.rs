//! 对话编排器：用户消息 → voice-chat → 追加助手回复
//!
//! 用户轮次在调用前同步追加，发送的历史是追加之前的记录；
//! 助手轮次只在成功时追加，失败只给提示并把状态置为 Error，直到下一次提交。

use std::sync::Arc;

use tokio::sync::watch;

use crate::core::{AppError, NoticeBus, SessionSupervisor, ViewState};
use crate::gateway::{ActionGateway, ActionOutput, GatewayError, RemoteActionRequest};
use crate::media::{SpeechHandle, Speaker};
use crate::memory::{ConversationTurn, Role, Transcript};
use crate::orchestrator::SubmitOutcome;

const SEND_FAILED: &str = "Failed to send message";

/// 对话视图：完整记录 + 最近一次提交的状态
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatView {
    pub transcript: Transcript,
    pub state: ViewState<String>,
}

pub struct ChatOrchestrator {
    gateway: Arc<dyn ActionGateway>,
    notices: NoticeBus,
    supervisor: SessionSupervisor,
    view_tx: watch::Sender<ChatView>,
}

impl ChatOrchestrator {
    pub fn new(gateway: Arc<dyn ActionGateway>, notices: NoticeBus) -> Self {
        let (view_tx, _) = watch::channel(ChatView::default());
        Self {
            gateway,
            notices,
            supervisor: SessionSupervisor::new(),
            view_tx,
        }
    }

    /// 以一条助手问候开场（资料页助手）；问候会随历史一起发送
    pub fn with_greeting(self, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        if !greeting.trim().is_empty() {
            self.view_tx
                .send_modify(|view| view.transcript.push(ConversationTurn::assistant(greeting)));
        }
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> ChatView {
        self.view_tx.borrow().clone()
    }

    pub fn transcript(&self) -> Transcript {
        self.view_tx.borrow().transcript.clone()
    }

    /// 发送一条消息
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            self.notices.error("Please enter a message");
            return SubmitOutcome::Rejected;
        }
        if self.supervisor.is_unmounted() {
            tracing::debug!("chat submit after unmount dropped");
            return SubmitOutcome::Abandoned;
        }

        let mut history = Vec::new();
        let started = self.view_tx.send_if_modified(|view| {
            if view.state.is_pending() {
                return false;
            }
            history = view.transcript.turns().to_vec();
            view.transcript.push(ConversationTurn::user(text));
            view.state = ViewState::Pending;
            true
        });
        if !started {
            tracing::debug!("chat submit ignored while pending");
            return SubmitOutcome::Ignored;
        }

        tracing::info!(history = history.len(), "sending chat message");
        let result = self
            .gateway
            .invoke(RemoteActionRequest::chat(text, &history))
            .await
            .and_then(|out| match out {
                ActionOutput::Reply(reply) => Ok(reply),
                other => Err(GatewayError::MalformedResponse(format!(
                    "expected reply, got {}",
                    other.action()
                ))),
            });

        if self.supervisor.is_unmounted() {
            tracing::debug!("late chat reply discarded after unmount");
            return SubmitOutcome::Abandoned;
        }

        match result {
            Ok(reply) => {
                self.view_tx.send_modify(|view| {
                    view.transcript.push(ConversationTurn::assistant(reply.clone()));
                    view.state = ViewState::Success(reply);
                });
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!("chat failed: {}", e);
                let message = Some(e.user_message())
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| SEND_FAILED.to_string());
                self.view_tx
                    .send_modify(|view| view.state = ViewState::Error(message.clone()));
                self.notices.error(message);
                SubmitOutcome::Failed
            }
        }
    }

    /// 朗读第 index 条助手轮次；失败以提示告知
    pub async fn speak_turn(&self, index: usize, speaker: &Speaker) -> Result<SpeechHandle, AppError> {
        let content = {
            let view = self.view_tx.borrow();
            match view.transcript.get(index) {
                Some(turn) if turn.role == Role::Assistant => turn.content.clone(),
                Some(_) => {
                    return Err(AppError::Validation("Only assistant replies can be read aloud".into()))
                }
                None => return Err(AppError::Validation(format!("No message at position {}", index))),
            }
        };

        speaker.speak(&content).await.map_err(|e| {
            let err = AppError::from(e);
            self.notices.error(err.user_message());
            err
        })
    }

    pub fn unmount(&self) {
        self.supervisor.unmount();
    }
}
