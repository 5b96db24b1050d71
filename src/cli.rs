//! Command-line interface for vocast
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voice-cloning podcast studio server
#[derive(Parser, Debug)]
#[command(name = "vocast", version, about = "Voice-cloning podcast studio server")]
pub struct Cli {
    /// Subcommand to execute (defaults to serve)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address override
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port override
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,

        /// Data directory override
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_args_means_default_serve() {
        let cli = Cli::parse_from(["vocast"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_serve_with_overrides() {
        let cli = Cli::parse_from([
            "vocast", "serve", "--host", "0.0.0.0", "--port", "8080", "--data-dir", "/srv/vocast",
        ]);
        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                data_dir,
            }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert_eq!(data_dir, Some(PathBuf::from("/srv/vocast")));
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["vocast", "serve", "--config", "/etc/vocast.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/vocast.toml")));
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::parse_from(["vocast", "config"]);
        assert!(matches!(cli.command, Some(Commands::Config)));
    }
}
