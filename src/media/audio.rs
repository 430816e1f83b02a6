//! 麦克风录音：设备事件流 → 单个音频片段
//!
//! 设备回调被建模为事件流，由后台任务缓冲；编排器只看到 `stop` 返回的一个 AudioClip。
//! 每个 AudioCapture 同时最多一个活动会话。

use std::pin::Pin;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::media::{MediaError, SessionGuard};

/// 录音设备事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Chunk(Vec<u8>),
    Stopped,
    Failed(String),
}

pub type AudioEventStream = Pin<Box<dyn Stream<Item = AudioEvent> + Send>>;

/// 停止录音并释放设备（对应停止全部音轨）
pub trait CaptureControl: Send + Sync {
    fn stop(&self);
}

/// 设备成功授权后返回的事件流与控制句柄
pub struct DeviceCapture {
    pub events: AudioEventStream,
    pub control: Box<dyn CaptureControl>,
}

/// 平台麦克风抽象；拒绝授权时返回 PermissionDenied
#[async_trait]
pub trait AudioDevice: Send + Sync {
    async fn acquire(&self) -> Result<DeviceCapture, MediaError>;
}

/// 录音结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub session_id: Uuid,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 进行中的录音会话；未 stop 即丢弃时也会停止设备
pub struct AudioSession {
    id: Uuid,
    control: Box<dyn CaptureControl>,
    collector: Option<JoinHandle<Result<Vec<u8>, MediaError>>>,
    stopped: bool,
    _guard: SessionGuard,
}

impl AudioSession {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        if !self.stopped {
            self.control.stop();
        }
    }
}

/// 录音适配器
pub struct AudioCapture {
    device: Arc<dyn AudioDevice>,
    active: Arc<AtomicBool>,
}

impl AudioCapture {
    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        Self {
            device,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// 申请麦克风并开始缓冲；已有会话时拒绝
    pub async fn start(&self) -> Result<AudioSession, MediaError> {
        let guard = SessionGuard::try_acquire(&self.active).ok_or(MediaError::CaptureBusy)?;

        let capture = self.device.acquire().await.map_err(|e| {
            tracing::warn!("microphone acquire failed: {}", e);
            e
        })?;

        let id = Uuid::new_v4();
        let collector = tokio::spawn(collect_chunks(capture.events));
        tracing::info!(session = %id, "recording started");

        Ok(AudioSession {
            id,
            control: capture.control,
            collector: Some(collector),
            stopped: false,
            _guard: guard,
        })
    }

    /// 停止录音、释放设备，返回合并后的音频片段
    pub async fn stop(&self, mut session: AudioSession) -> Result<AudioClip, MediaError> {
        session.control.stop();
        session.stopped = true;

        let bytes = match session.collector.take() {
            Some(handle) => handle
                .await
                .map_err(|e| MediaError::CaptureFailed(e.to_string()))??,
            None => Vec::new(),
        };
        tracing::info!(session = %session.id, bytes = bytes.len(), "recording stopped");

        Ok(AudioClip {
            session_id: session.id,
            mime: "audio/webm",
            bytes,
        })
    }
}

async fn collect_chunks(mut events: AudioEventStream) -> Result<Vec<u8>, MediaError> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    while let Some(event) = events.next().await {
        match event {
            AudioEvent::Chunk(chunk) if chunk.is_empty() => continue,
            AudioEvent::Chunk(chunk) => chunks.push(chunk),
            AudioEvent::Stopped => break,
            AudioEvent::Failed(reason) => return Err(MediaError::CaptureFailed(reason)),
        }
    }
    Ok(chunks.concat())
}
