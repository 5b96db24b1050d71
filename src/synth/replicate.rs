//! Replicate prediction API client for voice-clone TTS.
//!
//! Creates a prediction for the configured model, polls it to a terminal
//! state, normalizes the polymorphic `output` field into a single audio URL,
//! and downloads the audio next to the other temp artifacts.

use crate::config::SynthesisConfig;
use crate::error::{Result, VocastError};
use crate::synth::SpeechSynthesizer;
use crate::voice::store::mime_for_path;
use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Speech synthesizer backed by the Replicate prediction API.
pub struct ReplicateSynthesizer {
    client: reqwest::Client,
    api_base: String,
    model: String,
    api_token: Option<String>,
    poll_interval: Duration,
    temp_dir: PathBuf,
}

impl ReplicateSynthesizer {
    /// Build a synthesizer, reading the API token from the environment
    /// variable named in the config.
    ///
    /// A missing token is not a startup error — it surfaces per call, so
    /// the server can come up and report the problem on the failing job.
    pub fn from_env(config: &SynthesisConfig, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_token: std::env::var(&config.api_token_env).ok().filter(|t| !t.is_empty()),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            temp_dir: temp_dir.into(),
        }
    }

    /// Override the API token (for tests and embedding).
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    fn api_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| VocastError::Synthesis {
                message: "TTS API token is not configured".to_string(),
            })
    }

    async fn create_prediction(&self, input: serde_json::Value) -> Result<Prediction> {
        let url = format!("{}/models/{}/predictions", self.api_base, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_token()?)
            .json(&serde_json::json!({ "input": input }))
            .send()
            .await
            .map_err(|e| VocastError::Synthesis {
                message: format!("prediction request failed: {e}"),
            })?;

        parse_prediction_response(response).await
    }

    async fn poll_prediction(&self, id: &str) -> Result<Prediction> {
        let url = format!("{}/predictions/{}", self.api_base, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token()?)
            .send()
            .await
            .map_err(|e| VocastError::Synthesis {
                message: format!("prediction poll failed: {e}"),
            })?;

        parse_prediction_response(response).await
    }

    /// Wait for the prediction to leave its in-flight states.
    ///
    /// No deadline here: timeout behavior belongs to the remote contract.
    async fn await_terminal(&self, mut prediction: Prediction) -> Result<Prediction> {
        while prediction.is_in_flight() {
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.poll_prediction(&prediction.id).await?;
        }
        Ok(prediction)
    }

    /// Stream the synthesized audio down to `dest`.
    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VocastError::Synthesis {
                message: format!("failed to start audio download: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(VocastError::Synthesis {
                message: format!("audio download failed with status {}", response.status()),
            });
        }

        let mut stream = response.bytes_stream();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| VocastError::Synthesis {
                message: format!("failed to create {}: {e}", dest.display()),
            })?;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| VocastError::Synthesis {
                message: format!("failed to read download chunk: {e}"),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| VocastError::Synthesis {
                    message: format!("failed to write {}: {e}", dest.display()),
                })?;
        }

        file.flush().await.map_err(|e| VocastError::Synthesis {
            message: format!("failed to flush {}: {e}", dest.display()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ReplicateSynthesizer {
    async fn synthesize(
        &self,
        script: &str,
        reference_voice: &Path,
        job_id: &str,
        style: Option<&str>,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| VocastError::Synthesis {
                message: format!("failed to create {}: {e}", self.temp_dir.display()),
            })?;

        // A deleted voice surfaces here, as a read failure on its file.
        let voice_bytes =
            tokio::fs::read(reference_voice)
                .await
                .map_err(|e| VocastError::Synthesis {
                    message: format!(
                        "failed to read reference voice {}: {e}",
                        reference_voice.display()
                    ),
                })?;

        let mut input = serde_json::json!({
            "text": script,
            "mode": "voice_clone",
            "reference_audio": audio_data_uri(&voice_bytes, mime_for_path(reference_voice)),
            "reference_text": "",
            "language": "auto",
        });
        if let Some(style) = style {
            input["style_instruction"] = serde_json::Value::String(style.to_string());
        }

        debug!(job = job_id, model = %self.model, "creating TTS prediction");
        let prediction = self.create_prediction(input).await?;
        let prediction = self.await_terminal(prediction).await?;

        if prediction.status != "succeeded" {
            return Err(VocastError::Synthesis {
                message: prediction.failure_message(),
            });
        }

        let audio_url = prediction
            .output
            .as_ref()
            .ok_or_else(|| VocastError::Synthesis {
                message: "prediction succeeded without output".to_string(),
            })?
            .location()?;

        let dest = self.temp_dir.join(format!("{job_id}-tts.wav"));
        debug!(job = job_id, "downloading synthesized audio");
        self.download_audio(audio_url, &dest).await?;

        Ok(dest)
    }
}

async fn parse_prediction_response(response: reqwest::Response) -> Result<Prediction> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VocastError::Synthesis {
            message: format!("prediction API returned {status}: {}", body.trim()),
        });
    }
    response
        .json::<Prediction>()
        .await
        .map_err(|e| VocastError::Synthesis {
            message: format!("malformed prediction response: {e}"),
        })
}

/// One prediction as the API reports it.
#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<PredictionOutput>,
    #[serde(default)]
    error: Option<String>,
}

impl Prediction {
    fn is_in_flight(&self) -> bool {
        matches!(self.status.as_str(), "starting" | "processing")
    }

    fn failure_message(&self) -> String {
        match &self.error {
            Some(error) if !error.is_empty() => error.clone(),
            _ => format!("prediction ended with status {}", self.status),
        }
    }
}

/// The API's `output` field varies by model version: a plain URL string, a
/// wrapped file handle, or a list of URLs. Normalized here so callers only
/// ever see one location.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    Url(String),
    File { url: String },
    Batch(Vec<String>),
}

impl PredictionOutput {
    fn location(&self) -> Result<&str> {
        match self {
            PredictionOutput::Url(url) => Ok(url),
            PredictionOutput::File { url } => Ok(url),
            PredictionOutput::Batch(urls) => {
                urls.first()
                    .map(String::as_str)
                    .ok_or_else(|| VocastError::Synthesis {
                        message: "prediction output was an empty list".to_string(),
                    })
            }
        }
    }
}

/// Encode reference audio as a data URI the prediction input accepts.
fn audio_data_uri(bytes: &[u8], mime_type: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime_type};base64,{encoded}")
}
