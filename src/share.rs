//! Shareable collection link and its QR code.

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;
use url::Url;

use crate::collection::PhotoCollection;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported URL scheme '{0}', use http or https")]
    UnsupportedScheme(String),
    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
}

/// The link guests scan: the custom URL if one is set, otherwise
/// `<base_url>/<collection id>`.
pub fn collection_url(collection: &PhotoCollection, base_url: &str) -> String {
    match collection.custom_url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => format!("{}/{}", base_url.trim_end_matches('/'), collection.id),
    }
}

/// Validate operator input for the custom URL.
///
/// Blank input clears the custom URL. Valid input is kept as typed, only
/// trimmed, so the displayed link matches what the operator entered.
pub fn normalize_custom_url(input: &str) -> Result<Option<String>, ShareError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(input)?;
    match url.scheme() {
        "http" | "https" => Ok(Some(input.to_string())),
        other => Err(ShareError::UnsupportedScheme(other.to_string())),
    }
}

/// Render `data` as a QR code (high error correction, with quiet zone) at
/// least `size` pixels square.
pub fn render_qr(data: &str, size: u32) -> Result<GrayImage, ShareError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;
    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .build())
}
