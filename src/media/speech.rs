//! 文本转语音：提交给平台语音引擎，一次只播放一段
//!
//! 引擎的 start / end / error 回调建模为事件流，Speaker 将其折叠成一个完成值。

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::media::{MediaError, SessionGuard};

/// 语音引擎事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Ended,
    Failed(String),
}

pub type SpeechEventStream = Pin<Box<dyn Stream<Item = SpeechEvent> + Send>>;

/// 平台语音合成抽象
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    async fn utter(&self, text: &str) -> Result<SpeechEventStream, MediaError>;
}

/// 一次朗读的句柄
pub struct SpeechHandle {
    started: watch::Receiver<bool>,
    completion: JoinHandle<Result<(), MediaError>>,
}

impl SpeechHandle {
    /// 引擎是否已报告开始播放
    pub fn has_started(&self) -> bool {
        *self.started.borrow()
    }

    /// 等待朗读结束；中途失败或事件流提前结束返回 PlaybackError
    pub async fn finished(self) -> Result<(), MediaError> {
        self.completion
            .await
            .map_err(|e| MediaError::PlaybackError(e.to_string()))?
    }
}

/// 朗读适配器；engine 为 None 表示平台不支持
#[derive(Clone)]
pub struct Speaker {
    engine: Option<Arc<dyn SpeechEngine>>,
    speaking: Arc<AtomicBool>,
}

impl Speaker {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine: Some(engine),
            speaking: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            engine: None,
            speaking: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    pub async fn speak(&self, text: &str) -> Result<SpeechHandle, MediaError> {
        let engine = self
            .engine
            .as_ref()
            .filter(|e| e.is_supported())
            .ok_or(MediaError::SpeechUnsupported)?;
        if text.trim().is_empty() {
            return Err(MediaError::EmptyText);
        }

        let guard = SessionGuard::try_acquire(&self.speaking).ok_or(MediaError::SpeechBusy)?;
        let events = engine.utter(text).await?;

        let (started_tx, started) = watch::channel(false);
        let completion = tokio::spawn(async move {
            let _guard = guard;
            let result = follow_utterance(events, started_tx).await;
            if let Err(e) = &result {
                tracing::warn!("speech playback failed: {}", e);
            }
            result
        });

        Ok(SpeechHandle {
            started,
            completion,
        })
    }
}

async fn follow_utterance(
    mut events: SpeechEventStream,
    started: watch::Sender<bool>,
) -> Result<(), MediaError> {
    while let Some(event) = events.next().await {
        match event {
            SpeechEvent::Started => {
                started.send_replace(true);
            }
            SpeechEvent::Ended => return Ok(()),
            SpeechEvent::Failed(reason) => return Err(MediaError::PlaybackError(reason)),
        }
    }
    Err(MediaError::PlaybackError("utterance interrupted".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio::sync::Notify;

    /// 按预置事件回放的引擎；gate 非空时在结束事件前等待通知
    struct ScriptedEngine {
        events: Vec<SpeechEvent>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl SpeechEngine for ScriptedEngine {
        async fn utter(&self, _text: &str) -> Result<SpeechEventStream, MediaError> {
            let events = self.events.clone();
            let gate = self.gate.clone();
            let s = stream::iter(events).then(move |e| {
                let gate = gate.clone();
                async move {
                    if let (SpeechEvent::Ended, Some(g)) = (&e, gate) {
                        g.notified().await;
                    }
                    e
                }
            });
            Ok(Box::pin(s))
        }
    }

    #[tokio::test]
    async fn test_speak_completes() {
        let speaker = Speaker::new(Arc::new(ScriptedEngine {
            events: vec![SpeechEvent::Started, SpeechEvent::Ended],
            gate: None,
        }));
        let handle = speaker.speak("Take one tablet daily").await.unwrap();
        assert!(handle.finished().await.is_ok());
        assert!(!speaker.is_speaking());
    }

    #[tokio::test]
    async fn test_unsupported_and_empty() {
        assert!(matches!(
            Speaker::unsupported().speak("hello").await,
            Err(MediaError::SpeechUnsupported)
        ));
        let speaker = Speaker::new(Arc::new(ScriptedEngine {
            events: vec![],
            gate: None,
        }));
        assert!(matches!(speaker.speak("  ").await, Err(MediaError::EmptyText)));
    }

    #[tokio::test]
    async fn test_playback_error_mid_utterance() {
        let speaker = Speaker::new(Arc::new(ScriptedEngine {
            events: vec![SpeechEvent::Started, SpeechEvent::Failed("audio-busy".into())],
            gate: None,
        }));
        let err = speaker.speak("hello").await.unwrap().finished().await.unwrap_err();
        assert_eq!(err, MediaError::PlaybackError("audio-busy".into()));

        // 无结束事件的流同样视为中断
        let speaker = Speaker::new(Arc::new(ScriptedEngine {
            events: vec![SpeechEvent::Started],
            gate: None,
        }));
        let err = speaker.speak("hello").await.unwrap().finished().await.unwrap_err();
        assert!(matches!(err, MediaError::PlaybackError(_)));
    }

    #[tokio::test]
    async fn test_one_utterance_at_a_time() {
        let gate = Arc::new(Notify::new());
        let speaker = Speaker::new(Arc::new(ScriptedEngine {
            events: vec![SpeechEvent::Started, SpeechEvent::Ended],
            gate: Some(gate.clone()),
        }));

        let first = speaker.speak("first").await.unwrap();
        assert!(speaker.is_speaking());
        assert!(matches!(speaker.speak("second").await, Err(MediaError::SpeechBusy)));

        gate.notify_one();
        first.finished().await.unwrap();
        assert!(!speaker.is_speaking());
    }
}
