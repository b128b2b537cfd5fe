use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use super::preprocess::{FrameTensor, FRAME_BYTES, FRAME_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDecision {
    Keep,
    Skip,
}

/// Chooses which decoded frames to classify: every `interval`-th frame
/// counting from 0, at most `max_frames` in total.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    interval: usize,
    max_frames: usize,
    kept: usize,
}

impl FrameSampler {
    pub fn new(interval: usize, max_frames: usize) -> Self {
        Self {
            interval: interval.max(1),
            max_frames,
            kept: 0,
        }
    }

    /// Decide for the frame at `index` (0-based, in decode order).
    pub fn offer(&mut self, index: usize) -> SampleDecision {
        if self.is_done() || index % self.interval != 0 {
            return SampleDecision::Skip;
        }
        self.kept += 1;
        SampleDecision::Keep
    }

    pub fn is_done(&self) -> bool {
        self.kept >= self.max_frames
    }

    pub fn kept(&self) -> usize {
        self.kept
    }
}

/// Source of sampled video frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Decode `video_path` in order and return the frames the sampler keeps.
    /// An empty vector means nothing could be decoded.
    async fn sample_frames(
        &self,
        video_path: &Path,
        sampler: FrameSampler,
    ) -> Result<Vec<FrameTensor>>;
}

/// Decodes video with an `ffmpeg` child process streaming raw rgb24 frames
/// already scaled to the classifier's input size.
pub struct FfmpegFrameSource {
    ffmpeg_path: String,
}

impl FfmpegFrameSource {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn sample_frames(
        &self,
        video_path: &Path,
        mut sampler: FrameSampler,
    ) -> Result<Vec<FrameTensor>> {
        let scale = format!("scale={}:{}", FRAME_SIZE, FRAME_SIZE);
        let mut child = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .arg("-i")
            .arg(video_path)
            .args(["-an", "-sn"])
            .args(["-vf", &scale])
            .args(["-pix_fmt", "rgb24", "-f", "rawvideo", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.ffmpeg_path))?;

        let mut stdout = child
            .stdout
            .take()
            .context("ffmpeg stdout was not captured")?;

        let mut buffer = vec![0u8; FRAME_BYTES];
        let mut frames = Vec::new();
        let mut index = 0usize;

        while !sampler.is_done() {
            match stdout.read_exact(&mut buffer).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e).context("Failed to read decoded frame from ffmpeg"),
            }
            if sampler.offer(index) == SampleDecision::Keep {
                frames.push(FrameTensor::from_rgb_bytes(&buffer)?);
            }
            index += 1;
        }

        if sampler.is_done() {
            // Remaining frames are not needed.
            let _ = child.start_kill();
        }
        let status = child.wait().await.context("Failed to wait for ffmpeg")?;

        debug!(
            "Sampled {} of {} decoded frames from {:?} (ffmpeg {})",
            frames.len(),
            index,
            video_path,
            status
        );
        Ok(frames)
    }
}
