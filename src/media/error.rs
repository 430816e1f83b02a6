//! 媒体采集错误

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("Could not access microphone: {0}")]
    PermissionDenied(String),

    #[error("A recording is already in progress")]
    CaptureBusy,

    #[error("Recording failed: {0}")]
    CaptureFailed(String),

    #[error("Text-to-speech not supported on this platform")]
    SpeechUnsupported,

    #[error("Speech is already playing")]
    SpeechBusy,

    #[error("Could not play audio: {0}")]
    PlaybackError(String),

    #[error("Nothing to speak")]
    EmptyText,
}
