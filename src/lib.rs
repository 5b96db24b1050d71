//! vocast - Voice-cloning podcast studio server.
//!
//! Clone a voice from a short recording, synthesize a script read in that
//! voice through a remote TTS API, optionally mix in background music, and
//! download the finished mp3. Jobs live in memory and are driven through an
//! asynchronous pipeline that clients follow by polling.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod job;
pub mod synth;
pub mod voice;

// Collaborator seams (mix/transcode, synthesis)
pub use audio::{AudioProcessor, FfmpegProcessor};
pub use synth::{ReplicateSynthesizer, SpeechSynthesizer};

// Job pipeline
pub use job::{Job, JobRegistry, JobSpec, JobStatus, JobView, Orchestrator};

// Voice storage
pub use voice::{Voice, VoiceStore};

// Error handling
pub use error::{Result, VocastError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
        } else {
            assert!(!ver.contains('+'));
        }
    }
}
