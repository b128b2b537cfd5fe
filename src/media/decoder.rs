use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::TempPath;
use tracing::debug;

use crate::error::DetectError;

/// Decode a base64 media payload.
///
/// Accepts bare base64 as well as `data:<mime>;base64,<data>` URLs, and ignores
/// embedded ASCII whitespace (line-wrapped encoders).
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DetectError> {
    let data = strip_data_url(payload.trim());

    let bytes = if data.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD.decode(compact)?
    } else {
        STANDARD.decode(data)?
    };

    Ok(bytes)
}

fn strip_data_url(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((header, data)) = payload.split_once(',') {
            if header.ends_with(";base64") {
                return data;
            }
        }
    }
    payload
}

/// Uploaded video spooled to disk for the duration of one request.
///
/// The file is uniquely named and removed when the guard is dropped, which
/// covers early returns, errors and unwinding.
#[derive(Debug)]
pub struct TempVideo {
    path: TempPath,
}

impl TempVideo {
    pub fn create(bytes: &[u8], dir: &Path) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("deepfake-video-")
            .suffix(".mp4")
            .tempfile_in(dir)
            .with_context(|| format!("Failed to create temporary video in {}", dir.display()))?;

        file.write_all(bytes)
            .context("Failed to write temporary video")?;
        file.flush().context("Failed to flush temporary video")?;

        let path = file.into_temp_path();
        debug!("Spooled {} byte video to {:?}", bytes.len(), path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
