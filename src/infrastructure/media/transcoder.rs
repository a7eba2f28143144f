use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::constants::THUMBNAIL_WIDTH;
use crate::errors::TranscodeError;
use crate::settings::AppConfig;

#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Re-encodes a still image container as JPEG at `dest`.
    async fn convert_to_jpeg(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError>;

    /// Writes a fixed-width JPEG preview frame of a video to `dest`.
    async fn video_thumbnail(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError>;
}

/// Midpoint of the clip, or 0.1s for clips of a second or less.
pub fn thumbnail_offset(duration_secs: f64) -> f64 {
    if duration_secs > 1.0 {
        duration_secs / 2.0
    } else {
        0.1
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegTranscoder {
    pub fn new(config: &AppConfig) -> Self {
        FfmpegTranscoder {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
        }
    }

    async fn probe_duration(&self, source: &Path) -> Result<f64, TranscodeError> {
        let output = Command::new(&self.ffprobe_path)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(source)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn(self.ffprobe_path.clone(), e.to_string()))?;

        if !output.status.success() {
            return Err(TranscodeError::Failed(
                self.ffprobe_path.clone(),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .map_err(|_| TranscodeError::Probe(text.trim().to_string()))
    }

    async fn run_ffmpeg(&self, args: Vec<std::ffi::OsString>) -> Result<(), TranscodeError> {
        debug!(program = %self.ffmpeg_path, ?args, "running ffmpeg");

        let output = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn(self.ffmpeg_path.clone(), e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TranscodeError::Failed(
                self.ffmpeg_path.clone(),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn convert_to_jpeg(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError> {
        self.run_ffmpeg(vec![
            "-i".into(),
            source.into(),
            "-frames:v".into(),
            "1".into(),
            "-q:v".into(),
            "2".into(),
            "-y".into(),
            dest.into(),
        ])
        .await
    }

    async fn video_thumbnail(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError> {
        // An unreadable duration still gets a frame from near the start.
        let duration = self.probe_duration(source).await.unwrap_or(0.0);
        let offset = thumbnail_offset(duration);

        self.run_ffmpeg(vec![
            "-ss".into(),
            format!("{:.3}", offset).into(),
            "-i".into(),
            source.into(),
            "-frames:v".into(),
            "1".into(),
            "-vf".into(),
            format!("scale={}:-2", THUMBNAIL_WIDTH).into(),
            "-y".into(),
            dest.into(),
        ])
        .await
    }
}
