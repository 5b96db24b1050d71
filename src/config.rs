use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub synthesis: SynthesisConfig,
    pub mixing: MixingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// On-disk layout for voices, background music, temp files, and artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Remote TTS configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Model identifier on the prediction API (owner/name)
    pub model: String,
    /// Base URL of the prediction API
    pub api_base: String,
    /// Environment variable holding the API token
    pub api_token_env: String,
    /// Delay between prediction status polls
    pub poll_interval_ms: u64,
}

/// Audio post-processing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixingConfig {
    /// ffmpeg binary to invoke
    pub ffmpeg: String,
    /// Background-music volume used when a request does not specify one
    pub default_bgm_volume: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model: "qwen/qwen3-tts".to_string(),
            api_base: "https://api.replicate.com/v1".to_string(),
            api_token_env: "REPLICATE_API_TOKEN".to_string(),
            poll_interval_ms: 2000,
        }
    }
}

impl Default for MixingConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            default_bgm_volume: 0.3,
        }
    }
}

impl StorageConfig {
    /// Directory holding cloned voice audio and the voices.json index.
    pub fn voices_dir(&self) -> PathBuf {
        self.data_dir.join("voices")
    }

    /// Directory holding uploaded background-music blobs.
    pub fn bgm_dir(&self) -> PathBuf {
        self.data_dir.join("bgm")
    }

    /// Scratch directory for synthesized speech awaiting post-processing.
    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("temp")
    }

    /// Directory holding finished podcast artifacts.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("output")
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOCAST_HOST → server.host
    /// - VOCAST_PORT → server.port
    /// - VOCAST_DATA_DIR → storage.data_dir
    /// - VOCAST_FFMPEG → mixing.ffmpeg
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("VOCAST_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("VOCAST_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }

        if let Ok(data_dir) = std::env::var("VOCAST_DATA_DIR")
            && !data_dir.is_empty()
        {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(ffmpeg) = std::env::var("VOCAST_FFMPEG")
            && !ffmpeg.is_empty()
        {
            self.mixing.ffmpeg = ffmpeg;
        }

        self
    }

    /// Configuration file looked up when no --config flag is given
    pub fn default_path() -> PathBuf {
        PathBuf::from("vocast.toml")
    }
}
