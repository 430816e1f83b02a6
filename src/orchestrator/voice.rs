//! 语音输入按钮：一次按下开始录音，再按一次停止并得到片段
//!
//! 转写尚未接入，停止后提示用户改用文字输入。

use tokio::sync::Mutex;

use crate::core::{AppError, NoticeBus};
use crate::media::{AudioCapture, AudioClip, AudioSession};

/// `toggle` 的结果
#[derive(Debug, PartialEq, Eq)]
pub enum VoiceToggle {
    Started,
    Stopped(AudioClip),
    Failed,
}

pub struct VoiceInput {
    capture: AudioCapture,
    notices: NoticeBus,
    session: Mutex<Option<AudioSession>>,
}

impl VoiceInput {
    pub fn new(capture: AudioCapture, notices: NoticeBus) -> Self {
        Self {
            capture,
            notices,
            session: Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    pub async fn toggle(&self) -> VoiceToggle {
        let mut slot = self.session.lock().await;
        match slot.take() {
            None => match self.capture.start().await {
                Ok(session) => {
                    *slot = Some(session);
                    self.notices.info("Recording started");
                    VoiceToggle::Started
                }
                Err(e) => {
                    self.notices.error(AppError::from(e).user_message());
                    VoiceToggle::Failed
                }
            },
            Some(session) => match self.capture.stop(session).await {
                Ok(clip) => {
                    self.notices
                        .info("Voice transcription is not available yet. Please type your message.");
                    VoiceToggle::Stopped(clip)
                }
                Err(e) => {
                    self.notices.error(AppError::from(e).user_message());
                    VoiceToggle::Failed
                }
            },
        }
    }
}
