use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use vocast::app::App;
use vocast::cli::{Cli, Commands};
use vocast::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None => serve(config, None, None, None).await?,
        Some(Commands::Serve {
            host,
            port,
            data_dir,
        }) => serve(config, host, port, data_dir).await?,
        Some(Commands::Config) => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<std::path::PathBuf>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }

    let app = App::build(config).await?;
    app.serve().await?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        // An explicitly named file must exist.
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vocast=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
