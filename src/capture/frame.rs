//! Frame capture: crop, resample, filter and encode one video frame.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

use super::crop::CropRect;
use super::filter::Brightness;
use crate::config;

const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    InvalidFrame { expected: usize, actual: usize },
    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Not a JPEG data URI")]
    NotDataUri,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// One raw RGBA video frame, rows tightly packed
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Repack a strided RGBA buffer (as delivered by the video sink)
    pub fn from_strided(width: u32, height: u32, stride: usize, data: &[u8]) -> Option<Self> {
        let row_bytes = width as usize * 4;
        if stride < row_bytes || data.len() < stride * height.saturating_sub(1) as usize + row_bytes {
            return None;
        }

        let mut packed = Vec::with_capacity(row_bytes * height as usize);
        for row in data.chunks(stride).take(height as usize) {
            packed.extend_from_slice(&row[..row_bytes]);
        }

        Some(Self {
            width,
            height,
            data: packed,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An encoded photo held in memory as a JPEG data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    pub fn from_jpeg(jpeg: &[u8], width: u32, height: u32) -> Self {
        Self {
            data_uri: format!("{}{}", JPEG_DATA_URI_PREFIX, BASE64.encode(jpeg)),
            width,
            height,
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Decode back to the raw JPEG bytes
    pub fn jpeg_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        decode_data_uri(&self.data_uri)
    }
}

/// Decode a `data:image/jpeg;base64,` URI into bytes
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, CaptureError> {
    let payload = uri
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .ok_or(CaptureError::NotDataUri)?;
    Ok(BASE64.decode(payload)?)
}

/// Turn the current video frame into a print-ready photo.
///
/// Returns `Ok(None)` when there is no frame to capture yet.
pub fn capture_frame(
    frame: Option<Frame>,
    brightness: Brightness,
) -> Result<Option<CapturedImage>, CaptureError> {
    let frame = match frame {
        Some(frame) if !frame.is_empty() => frame,
        _ => {
            log::debug!("No video frame available, skipping capture");
            return Ok(None);
        }
    };

    let (frame_width, frame_height) = (frame.width, frame.height);
    let expected = frame_width as usize * frame_height as usize * 4;
    let actual = frame.data.len();
    let source = RgbaImage::from_raw(frame_width, frame_height, frame.data)
        .ok_or(CaptureError::InvalidFrame { expected, actual })?;

    let crop = CropRect::centered(frame_width, frame_height, config::ASPECT_RATIO);
    let (x, y, width, height) = crop.to_pixels(frame_width, frame_height);
    log::debug!(
        "Cropping {}x{} frame to {}x{} at ({}, {})",
        frame_width,
        frame_height,
        width,
        height,
        x,
        y
    );

    let cropped = imageops::crop_imm(&source, x, y, width, height).to_image();
    let mut output = imageops::resize(
        &cropped,
        config::OUTPUT_WIDTH,
        config::OUTPUT_HEIGHT,
        FilterType::Triangle,
    );
    brightness.apply(&mut output);

    let rgb = DynamicImage::ImageRgba8(output).to_rgb8();
    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, config::JPEG_QUALITY).encode_image(&rgb)?;
    let jpeg = jpeg.into_inner();

    log::info!(
        "Captured {}x{} photo ({} bytes, brightness {}%)",
        config::OUTPUT_WIDTH,
        config::OUTPUT_HEIGHT,
        jpeg.len(),
        brightness.percent()
    );

    Ok(Some(CapturedImage::from_jpeg(
        &jpeg,
        config::OUTPUT_WIDTH,
        config::OUTPUT_HEIGHT,
    )))
}
