//! 图片编码：相机或文件 → data URL
//!
//! 仅接受图片（PNG / JPEG / GIF / WebP / BMP，按魔数识别，失败时看扩展名）；
//! 空内容或读取失败返回 UnsupportedMedia。预览与提交共用同一份 data URL。

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::media::MediaError;

/// 图片来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    File,
}

/// 用户选择的原始图片
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub origin: ImageOrigin,
    pub bytes: Vec<u8>,
    /// 文件名（相机拍摄时通常没有）
    pub file_name: Option<String>,
}

impl ImageSource {
    pub fn camera(bytes: Vec<u8>) -> Self {
        Self {
            origin: ImageOrigin::Camera,
            bytes,
            file_name: None,
        }
    }

    pub fn file(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            origin: ImageOrigin::File,
            bytes,
            file_name: Some(file_name.into()),
        }
    }

    /// 从磁盘读取；读取失败视为不可用媒体
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::UnsupportedMedia(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::file(bytes, name))
    }
}

/// 已编码图片：可直接放进请求体，也可作为预览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data_url: Arc<str>,
    mime: &'static str,
    byte_len: usize,
    origin: ImageOrigin,
}

impl ImageAsset {
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// 预览形式（与 data URL 共享内存）
    pub fn preview(&self) -> Arc<str> {
        Arc::clone(&self.data_url)
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len == 0
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// 编码为 `data:<mime>;base64,<payload>`
pub fn encode_image(source: ImageSource) -> Result<ImageAsset, MediaError> {
    if source.bytes.is_empty() {
        return Err(MediaError::UnsupportedMedia("image is empty".to_string()));
    }

    let mime = sniff_mime(&source.bytes)
        .or_else(|| source.file_name.as_deref().and_then(mime_from_name))
        .ok_or_else(|| MediaError::UnsupportedMedia("not a recognized image".to_string()))?;

    let data_url = format!("data:{};base64,{}", mime, BASE64.encode(&source.bytes));
    tracing::debug!(mime, bytes = source.bytes.len(), "image encoded");

    Ok(ImageAsset {
        data_url: Arc::from(data_url),
        mime,
        byte_len: source.bytes.len(),
        origin: source.origin,
    })
}
