use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::interface::AudioExtractorInterface;

/// Extracts the audio track with `ffmpeg` into a temporary 16-bit PCM WAV file,
/// mono, resampled to `sample_rate`. The WAV file is removed once read, whether
/// or not extraction succeeded.
pub struct FfmpegAudioExtractor {
    ffmpeg_path: String,
    sample_rate: u32,
    temp_dir: PathBuf,
}

impl FfmpegAudioExtractor {
    pub fn new(ffmpeg_path: impl Into<String>, sample_rate: u32, temp_dir: PathBuf) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            sample_rate,
            temp_dir,
        }
    }
}

#[async_trait]
impl AudioExtractorInterface for FfmpegAudioExtractor {
    async fn extract(&self, video_path: &Path) -> Result<Vec<f32>> {
        let wav_path = tempfile::Builder::new()
            .prefix("deepfake-audio-")
            .suffix(".wav")
            .tempfile_in(&self.temp_dir)
            .context("Failed to create temporary audio file")?
            .into_temp_path();

        let sample_rate = self.sample_rate.to_string();
        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .arg("-i")
            .arg(video_path)
            .args(["-vn", "-ac", "1", "-ar", &sample_rate])
            .args(["-c:a", "pcm_s16le", "-f", "wav", "-y"])
            .arg(&*wav_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", self.ffmpeg_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg audio extraction failed: {}", stderr.trim());
        }

        let path = wav_path.to_path_buf();
        let expected_rate = self.sample_rate;
        let samples = tokio::task::spawn_blocking(move || read_wav_samples(&path, expected_rate))
            .await
            .context("WAV reader task failed")??;

        if samples.is_empty() {
            anyhow::bail!("Video has no audio samples");
        }

        debug!("Extracted {} audio samples from {:?}", samples.len(), video_path);
        Ok(samples)
    }
}

/// Read a WAV file as mono f32 samples in [-1, 1], averaging channels.
pub fn read_wav_samples(path: &Path, expected_rate: u32) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;

    let spec = reader.spec();
    if spec.sample_rate != expected_rate {
        anyhow::bail!(
            "Expected {}Hz sample rate, got {}Hz",
            expected_rate,
            spec.sample_rate
        );
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|sample| sample as f32 / max_val))
                .collect::<Result<_, _>>()
                .context("Failed to read sample")?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("Failed to read sample")?,
    };

    let channels = spec.channels.max(1) as usize;
    if channels == 1 {
        return Ok(interleaved);
    }

    Ok(interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect())
}
