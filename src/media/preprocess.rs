use std::io::Cursor;

use anyhow::Result;
use image::imageops::FilterType;
use image::ImageReader;
use ndarray::Array4;

use crate::error::DetectError;

/// Side length of the square input the image classifier expects.
pub const FRAME_SIZE: u32 = 128;
pub const FRAME_CHANNELS: usize = 3;
/// Byte length of one raw rgb24 frame at `FRAME_SIZE`.
pub const FRAME_BYTES: usize = (FRAME_SIZE as usize) * (FRAME_SIZE as usize) * FRAME_CHANNELS;

/// NHWC float tensor of shape (1, 128, 128, 3), RGB, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTensor {
    data: Array4<f32>,
}

impl FrameTensor {
    /// Build a tensor from a raw 128x128 rgb24 buffer.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_BYTES {
            anyhow::bail!(
                "Expected {} bytes for a {}x{} RGB frame, got {}",
                FRAME_BYTES,
                FRAME_SIZE,
                FRAME_SIZE,
                bytes.len()
            );
        }

        let values = bytes.iter().map(|&b| b as f32 / 255.0).collect();
        let side = FRAME_SIZE as usize;
        let data = Array4::from_shape_vec((1, side, side, FRAME_CHANNELS), values)?;
        Ok(Self { data })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }
}

/// Decode an uploaded image and normalise it for the image classifier.
pub fn preprocess_image(bytes: &[u8]) -> Result<FrameTensor, DetectError> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DetectError::UnreadableMedia(e.to_string()))?
        .decode()
        .map_err(|e| DetectError::UnreadableMedia(e.to_string()))?;

    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, FRAME_SIZE, FRAME_SIZE, FilterType::Triangle);

    Ok(FrameTensor::from_rgb_bytes(resized.as_raw())?)
}
