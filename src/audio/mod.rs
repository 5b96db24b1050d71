//! Audio post-processing: bgm mixing and delivery-format transcoding.

pub mod ffmpeg;

pub use ffmpeg::FfmpegProcessor;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Turns synthesized speech into the delivery artifact.
///
/// Object-safe, Send + Sync for use across concurrent orchestration tasks.
/// Enables testability by allowing mock implementations.
#[async_trait]
pub trait AudioProcessor: Send + Sync {
    /// Mix speech with background music at `volume` (0.0–1.0), writing the
    /// delivery mp3 to `dest`.
    async fn mix(&self, speech: &Path, bgm: &Path, volume: f32, dest: &Path) -> Result<()>;

    /// Transcode speech alone to the delivery mp3 at `dest`.
    async fn transcode(&self, speech: &Path, dest: &Path) -> Result<()>;
}
