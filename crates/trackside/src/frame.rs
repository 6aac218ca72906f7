//! Data-URL image decoding.
//!
//! Clients post camera frames as `data:image/jpeg;base64,<payload>`. Only the
//! part after the first comma matters; the prefix is not inspected and the
//! codec is sniffed from the bytes.

use base64::Engine;
use image::{ImageError, ImageReader, Limits};
use std::io::Cursor;
use thiserror::Error;
use trackconf::LimitsConfig;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image data has no ',' separator")]
    MissingSeparator,

    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unreadable image: {0}")]
    Image(String),

    #[error("image exceeds decode limits: {0}")]
    TooLarge(String),
}

/// Decoder resource ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_alloc_bytes: u64,
}

impl From<&LimitsConfig> for DecodeLimits {
    fn from(cfg: &LimitsConfig) -> Self {
        Self {
            max_width: cfg.max_image_width,
            max_height: cfg.max_image_height,
            max_alloc_bytes: cfg.max_image_alloc_bytes,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

/// A decoded RGB8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major, 3 bytes per pixel.
    pub pixels: Vec<u8>,
}

pub fn decode_data_url(payload: &str, limits: DecodeLimits) -> Result<Frame, DecodeError> {
    let (_, encoded) = payload.split_once(',').ok_or(DecodeError::MissingSeparator)?;
    // MIME-wrapped payloads carry line breaks every 76 chars
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Image(e.to_string()))?;

    let mut decoder_limits = Limits::default();
    decoder_limits.max_image_width = Some(limits.max_width);
    decoder_limits.max_image_height = Some(limits.max_height);
    decoder_limits.max_alloc = Some(limits.max_alloc_bytes);
    reader.limits(decoder_limits);

    let image = reader.decode().map_err(|e| match e {
        ImageError::Limits(l) => DecodeError::TooLarge(l.to_string()),
        other => DecodeError::Image(other.to_string()),
    })?;
    let rgb = image.to_rgb8();

    Ok(Frame {
        width: rgb.width(),
        height: rgb.height(),
        pixels: rgb.into_raw(),
    })
}

/// Decode on the blocking pool; codecs are CPU-bound.
pub async fn decode_data_url_blocking(
    payload: String,
    limits: DecodeLimits,
) -> Result<Frame, DecodeError> {
    tokio::task::spawn_blocking(move || decode_data_url(&payload, limits))
        .await
        .map_err(|e| DecodeError::Image(format!("decoder task failed: {e}")))?
}
