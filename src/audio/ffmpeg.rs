//! ffmpeg-backed audio post-processing.
//!
//! Mixing trims the bgm to the speech duration and lowers its volume before
//! an amix; both operations encode with libmp3lame at VBR quality 2.

use crate::audio::AudioProcessor;
use crate::error::{Result, VocastError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Audio processor shelling out to an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    binary: String,
}

impl FfmpegProcessor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<()> {
        debug!(binary = %self.binary, "running audio post-processing");
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VocastError::Processing {
                        message: format!(
                            "{} not found — install ffmpeg or set mixing.ffmpeg in the config",
                            self.binary
                        ),
                    }
                } else {
                    VocastError::Processing {
                        message: format!("failed to run {}: {e}", self.binary),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VocastError::Processing {
                message: format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl AudioProcessor for FfmpegProcessor {
    async fn mix(&self, speech: &Path, bgm: &Path, volume: f32, dest: &Path) -> Result<()> {
        self.run(mix_args(speech, bgm, volume, dest)).await
    }

    async fn transcode(&self, speech: &Path, dest: &Path) -> Result<()> {
        self.run(transcode_args(speech, dest)).await
    }
}

fn mix_args(speech: &Path, bgm: &Path, volume: f32, dest: &Path) -> Vec<OsString> {
    let filter = format!(
        "[1:a]volume={volume}[bgm];[0:a][bgm]amix=inputs=2:duration=first:dropout_transition=2[out]"
    );
    vec![
        "-y".into(),
        "-i".into(),
        speech.into(),
        "-i".into(),
        bgm.into(),
        "-filter_complex".into(),
        filter.into(),
        "-map".into(),
        "[out]".into(),
        "-codec:a".into(),
        "libmp3lame".into(),
        "-q:a".into(),
        "2".into(),
        dest.into(),
    ]
}

fn transcode_args(speech: &Path, dest: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        speech.into(),
        "-codec:a".into(),
        "libmp3lame".into(),
        "-q:a".into(),
        "2".into(),
        dest.into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_mix_args_wire_both_inputs_through_amix() {
        let args = strings(&mix_args(
            Path::new("/tmp/speech.wav"),
            Path::new("/tmp/bgm.mp3"),
            0.5,
            Path::new("/tmp/out.mp3"),
        ));

        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "-i");
        assert_eq!(args[2], "/tmp/speech.wav");
        assert_eq!(args[3], "-i");
        assert_eq!(args[4], "/tmp/bgm.mp3");

        let filter = &args[6];
        assert!(filter.contains("volume=0.5"));
        assert!(filter.contains("amix=inputs=2:duration=first:dropout_transition=2"));

        assert!(args.contains(&"libmp3lame".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp3");
    }

    #[test]
    fn test_mix_args_volume_is_interpolated() {
        let args = strings(&mix_args(
            Path::new("s.wav"),
            Path::new("b.mp3"),
            0.25,
            Path::new("o.mp3"),
        ));
        assert!(args[6].starts_with("[1:a]volume=0.25[bgm]"));
    }

    #[test]
    fn test_transcode_args_single_input() {
        let args = strings(&transcode_args(
            Path::new("/tmp/speech.wav"),
            Path::new("/tmp/out.mp3"),
        ));
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/tmp/speech.wav",
                "-codec:a",
                "libmp3lame",
                "-q:a",
                "2",
                "/tmp/out.mp3",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_maps_to_processing_error() {
        let processor = FfmpegProcessor::new("vocast-test-no-such-ffmpeg");
        let err = processor
            .transcode(Path::new("in.wav"), Path::new("out.mp3"))
            .await
            .unwrap_err();

        match err {
            VocastError::Processing { message } => {
                assert!(message.contains("vocast-test-no-such-ffmpeg"));
                assert!(message.contains("not found"));
            }
            other => panic!("expected Processing error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failing_command_captures_stderr() {
        // `false` exits non-zero with no output; the status lands in the message.
        let processor = FfmpegProcessor::new("false");
        let err = processor
            .transcode(Path::new("in.wav"), Path::new("out.mp3"))
            .await
            .unwrap_err();

        match err {
            VocastError::Processing { message } => {
                assert!(message.contains("exited with"));
            }
            other => panic!("expected Processing error, got {other:?}"),
        }
    }

    #[test]
    fn test_paths_pass_through_unmodified() {
        let dest = PathBuf::from("/data/output/abc.mp3");
        let args = transcode_args(Path::new("/data/temp/abc-tts.wav"), &dest);
        assert_eq!(args.last().unwrap(), &OsString::from(dest));
    }
}
