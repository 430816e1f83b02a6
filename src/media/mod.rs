//! 媒体采集适配层：图片编码、麦克风录音、文本转语音
//!
//! 麦克风与语音引擎都是进程级单例资源，各自由一个 AtomicBool 保证同时最多一个活动会话。

pub mod audio;
pub mod error;
pub mod image;
pub mod speech;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use audio::{
    AudioCapture, AudioClip, AudioDevice, AudioEvent, AudioEventStream, AudioSession,
    CaptureControl, DeviceCapture,
};
pub use error::MediaError;
pub use image::{encode_image, ImageAsset, ImageOrigin, ImageSource};
pub use speech::{SpeechEngine, SpeechEvent, SpeechEventStream, SpeechHandle, Speaker};

/// 占用标志的 RAII 守卫：Drop 时释放
pub(crate) struct SessionGuard(Arc<AtomicBool>);

impl SessionGuard {
    /// 标志空闲时占用并返回守卫，已被占用返回 None
    pub(crate) fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SessionGuard(Arc::clone(flag)))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
