//! Composition root: builds every component from config and serves HTTP.
//!
//! Everything is constructed once here and handed down by `Arc`; no module
//! reaches for ambient state.

use crate::audio::FfmpegProcessor;
use crate::config::Config;
use crate::error::{Result, VocastError};
use crate::http::{self, AppState};
use crate::job::{JobRegistry, Orchestrator};
use crate::synth::ReplicateSynthesizer;
use crate::voice::VoiceStore;
use axum::Router;
use std::sync::Arc;
use tracing::info;

/// A fully wired server, ready to serve.
pub struct App {
    config: Config,
    router: Router,
}

impl App {
    /// Wire the registry, stores, and collaborators from config, creating
    /// the on-disk layout as needed.
    pub async fn build(config: Config) -> Result<Self> {
        let storage = &config.storage;
        for dir in [storage.bgm_dir(), storage.temp_dir(), storage.output_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| VocastError::Storage {
                    message: format!("failed to create {}: {e}", dir.display()),
                })?;
        }

        let voices = Arc::new(VoiceStore::new(storage.voices_dir()));
        voices.ensure_dirs().await?;

        let synthesizer = Arc::new(ReplicateSynthesizer::from_env(
            &config.synthesis,
            storage.temp_dir(),
        ));
        let processor = Arc::new(FfmpegProcessor::new(&config.mixing.ffmpeg));

        let registry = Arc::new(JobRegistry::new());
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&voices),
            synthesizer,
            processor,
            storage.bgm_dir(),
            storage.output_dir(),
        ));

        let router = http::router(AppState {
            voices,
            registry,
            orchestrator,
            bgm_dir: storage.bgm_dir(),
            output_dir: storage.output_dir(),
            default_bgm_volume: config.mixing.default_bgm_volume,
        });

        Ok(Self { config, router })
    }

    /// The assembled router (exposed for in-process testing).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind and serve until ctrl-c.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind((
            self.config.server.host.as_str(),
            self.config.server.port,
        ))
        .await?;
        info!(addr = %listener.local_addr()?, "vocast listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("vocast shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    // An error here means no signal handler could be installed; serving
    // without graceful shutdown beats not serving.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
