//! Image upload: reading, format sniffing and encoding for the vision call.
//!
//! The MIME type comes from magic bytes, never from file extensions or the
//! type a data URL claims.

use std::path::Path;
use std::sync::OnceLock;

use base64::Engine as _;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Largest image accepted for analysis.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image is empty")]
    Empty,

    #[error("Image too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    TooLarge { size_mb: f64, max_mb: usize },

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

/// A decoded image ready for transcription.
#[derive(Clone)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    mime_type: &'static str,
    digest: String,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .field("digest", &self.digest)
            .finish()
    }
}

impl ImageUpload {
    /// Validate raw bytes and sniff their format.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
                max_mb: MAX_IMAGE_BYTES / (1024 * 1024),
            });
        }

        let mime_type = detect_image_mime(&bytes).ok_or(ImageError::UnsupportedFormat)?;
        let digest = base64::engine::general_purpose::STANDARD.encode(Sha256::digest(&bytes));

        Ok(Self {
            bytes,
            mime_type,
            digest,
        })
    }

    /// Decode a browser-style `data:image/...;base64,` URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageError> {
        let captures = data_url_regex()
            .captures(data_url.trim())
            .ok_or_else(|| ImageError::InvalidDataUrl("expected data:image/*;base64,".into()))?;
        let payload = captures
            .name("data")
            .map(|m| m.as_str())
            .unwrap_or_default();

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ImageError::InvalidDataUrl(e.to_string()))?;

        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// SHA-256 of the image bytes, base64 encoded.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Preview shown while the pipeline runs.
    pub fn preview_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Read an image from disk.
pub async fn read_image(path: impl AsRef<Path>) -> Result<ImageUpload, ImageError> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_IMAGE_BYTES as u64 {
        return Err(ImageError::TooLarge {
            size_mb: metadata.len() as f64 / (1024.0 * 1024.0),
            max_mb: MAX_IMAGE_BYTES / (1024 * 1024),
        });
    }

    let bytes = tokio::fs::read(path).await?;
    let upload = ImageUpload::from_bytes(bytes)?;
    tracing::debug!(
        path = %path.display(),
        mime_type = upload.mime_type(),
        size = upload.len(),
        "Image read"
    );
    Ok(upload)
}

/// Detect a raster image format from magic bytes.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'B', b'M', ..] => Some("image/bmp"),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Some("image/tiff"),
        // HEIC/HEIF: "ftyp" box at offset 4 with a heic-family brand
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if is_heif_brand(brand) => Some("image/heic"),
        _ => None,
    }
}

fn is_heif_brand(rest: &[u8]) -> bool {
    const BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"hevc", b"heim", b"heis", b"mif1", b"msf1"];
    rest.len() >= 4 && BRANDS.iter().any(|b| &rest[..4] == b.as_slice())
}

fn data_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,(?P<data>[A-Za-z0-9+/=]+)$")
            .expect("data URL pattern is valid")
    })
}
