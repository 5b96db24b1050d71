//! Drives one job through `pending → synthesizing → mixing → completed`,
//! or to `failed` on the first error.
//!
//! One orchestration run exists per job. It is dispatched as a detached
//! task immediately after creation and never joined by the creating
//! request; clients follow progress by polling the registry. The run body
//! is wrapped in a catch-all (errors and panics alike) so a job can never
//! be left in a non-terminal state, and a failure terminates only its own
//! job.

use crate::audio::AudioProcessor;
use crate::error::{Result, VocastError};
use crate::job::registry::JobRegistry;
use crate::synth::SpeechSynthesizer;
use crate::voice::VoiceStore;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the collaborators each orchestration run needs.
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    voices: Arc<VoiceStore>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    processor: Arc<dyn AudioProcessor>,
    bgm_dir: PathBuf,
    output_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<JobRegistry>,
        voices: Arc<VoiceStore>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        processor: Arc<dyn AudioProcessor>,
        bgm_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            voices,
            synthesizer,
            processor,
            bgm_dir,
            output_dir,
        }
    }

    /// Launch the orchestration run for a freshly created job.
    ///
    /// Fire-and-forget: the handle is returned for tests and shutdown
    /// accounting, but nothing needs to join it — the supervision boundary
    /// inside the task resolves the job to `completed` or `failed` no
    /// matter how the run ends.
    pub fn dispatch(self: &Arc<Self>, job_id: String) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match AssertUnwindSafe(this.run(&job_id)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => this.resolve_failure(&job_id, err.to_string()).await,
                // A panic in a collaborator must not leave the job in flight.
                Err(_) => {
                    this.resolve_failure(
                        &job_id,
                        "internal error while processing the job".to_string(),
                    )
                    .await;
                }
            }
        })
    }

    async fn run(&self, job_id: &str) -> Result<()> {
        let job = self
            .registry
            .get(job_id)
            .await
            .ok_or_else(|| VocastError::not_found("Job", job_id))?;

        // Immutable request fields, read once.
        let (script, voice_id, style, bgm_file, bgm_volume) = {
            let job = job.read().await;
            (
                job.script.clone(),
                job.voice_id.clone(),
                job.style_instruction.clone(),
                job.bgm_file.clone(),
                job.bgm_volume,
            )
        };

        job.write().await.begin_synthesis();
        info!(job = job_id, voice = %voice_id, "synthesizing speech");

        // The voice may have been deleted since the request was validated.
        let voice = self
            .voices
            .find_by_id(&voice_id)
            .await?
            .ok_or_else(|| VocastError::not_found("Voice", &*voice_id))?;
        let voice_path = self.voices.file_path(&voice);

        let speech = self
            .synthesizer
            .synthesize(&script, &voice_path, job_id, style.as_deref())
            .await?;

        job.write().await.begin_mix();

        tokio::fs::create_dir_all(&self.output_dir).await?;
        // Artifact name is derived from the job id so download needs no
        // separate location index.
        let output_file = format!("{job_id}.mp3");
        let dest = self.output_dir.join(&output_file);

        match bgm_file {
            Some(name) => {
                info!(job = job_id, bgm = %name, volume = bgm_volume, "mixing with bgm");
                self.processor
                    .mix(&speech, &self.bgm_dir.join(&name), bgm_volume, &dest)
                    .await?;
            }
            None => {
                info!(job = job_id, "transcoding to delivery format");
                self.processor.transcode(&speech, &dest).await?;
            }
        }

        job.write().await.complete(output_file);
        info!(job = job_id, "job completed");
        Ok(())
    }

    async fn resolve_failure(&self, job_id: &str, message: String) {
        warn!(job = job_id, error = %message, "job failed");
        if let Some(job) = self.registry.get(job_id).await {
            job.write().await.fail(message);
        }
    }
}
