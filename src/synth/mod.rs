//! Speech synthesis against a remote voice-cloning TTS API.

pub mod replicate;

pub use replicate::ReplicateSynthesizer;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Produces spoken audio for a script in a cloned voice.
///
/// Object-safe, Send + Sync for use across concurrent orchestration tasks.
/// Enables testability by allowing mock implementations.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `script` spoken in the voice sampled at `reference_voice`.
    ///
    /// `job_id` is the correlation token naming the temp artifact; `style`
    /// is an optional free-text delivery hint (tone, speed, emotion).
    /// Returns the path of the synthesized audio file.
    ///
    /// # Errors
    ///
    /// Any remote failure — bad input, quota, network, malformed output —
    /// surfaces as [`VocastError::Synthesis`](crate::error::VocastError)
    /// carrying the upstream diagnostic.
    async fn synthesize(
        &self,
        script: &str,
        reference_voice: &Path,
        job_id: &str,
        style: Option<&str>,
    ) -> Result<PathBuf>;
}
