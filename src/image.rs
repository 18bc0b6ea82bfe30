//! Image input: files on disk, camera data URLs and base64 uploads.
//!
//! Every source is normalised into an [`ImageInput`] holding raw bytes plus a
//! MIME type. The model client re-encodes the bytes as base64 inline data.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::Path;

use crate::config::UploadConfig;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_WEBP: &str = "image/webp";
pub const MIME_PDF: &str = "application/pdf";

/// Input rejected before any model call.
#[derive(Debug)]
pub enum ImageError {
    Read(String),
    Empty,
    TooLarge { size: usize, max: usize },
    UnsupportedType(String),
    InvalidDataUrl(String),
    InvalidBase64(String),
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::Read(e) => write!(f, "failed to read image: {}", e),
            ImageError::Empty => write!(f, "image is empty"),
            ImageError::TooLarge { size, max } => {
                write!(f, "image is {} bytes, limit is {} bytes", size, max)
            }
            ImageError::UnsupportedType(t) => write!(f, "unsupported content-type: {}", t),
            ImageError::InvalidDataUrl(e) => write!(f, "invalid data URL: {}", e),
            ImageError::InvalidBase64(e) => write!(f, "invalid base64 payload: {}", e),
        }
    }
}

impl std::error::Error for ImageError {}

/// One document image ready to send to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageInput {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Reads a file, inferring the MIME type from the extension and falling
    /// back to the leading magic bytes.
    pub fn from_path(path: &Path) -> Result<Self, ImageError> {
        let data = std::fs::read(path)
            .map_err(|e| ImageError::Read(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_from_extension(path)
            .or_else(|| sniff_mime(&data))
            .unwrap_or("application/octet-stream");
        Ok(Self::new(file_name, mime_type, data))
    }

    /// Parses a `data:<mime>;base64,<payload>` URL, as produced by a
    /// browser canvas capture.
    pub fn from_data_url(file_name: Option<&str>, url: &str) -> Result<Self, ImageError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::InvalidDataUrl("missing ',' separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::InvalidDataUrl("only base64 data URLs are supported".to_string()))?;
        if mime_type.is_empty() {
            return Err(ImageError::InvalidDataUrl("missing MIME type".to_string()));
        }
        let data = BASE64
            .decode(payload.trim())
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;
        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => capture_file_name(),
        };
        Ok(Self::new(file_name, mime_type, data))
    }

    /// Decodes a base64 payload sent alongside its name and MIME type.
    pub fn from_base64(file_name: &str, mime_type: &str, payload: &str) -> Result<Self, ImageError> {
        let data = BASE64
            .decode(payload.trim())
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;
        Ok(Self::new(file_name, mime_type, data))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// `data:` URL for previewing the image next to the form.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Checks size and type against the upload limits.
    pub fn validate(&self, limits: &UploadConfig) -> Result<(), ImageError> {
        if self.data.is_empty() {
            return Err(ImageError::Empty);
        }
        if self.data.len() > limits.max_file_bytes {
            return Err(ImageError::TooLarge {
                size: self.data.len(),
                max: limits.max_file_bytes,
            });
        }
        if !limits
            .allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&self.mime_type))
        {
            return Err(ImageError::UnsupportedType(self.mime_type.clone()));
        }
        Ok(())
    }
}

/// Name given to camera captures: `scan-<unix millis>.jpeg`.
pub fn capture_file_name() -> String {
    format!("scan-{}.jpeg", chrono::Utc::now().timestamp_millis())
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(MIME_PNG),
        "jpg" | "jpeg" => Some(MIME_JPEG),
        "webp" => Some(MIME_WEBP),
        "pdf" => Some(MIME_PDF),
        _ => None,
    }
}

fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some(MIME_PNG)
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(MIME_JPEG)
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(MIME_WEBP)
    } else if data.starts_with(b"%PDF") {
        Some(MIME_PDF)
    } else {
        None
    }
}
