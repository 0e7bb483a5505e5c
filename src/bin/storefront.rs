//! Storefront HTTP server binary.
//!
//! Usage: `storefront [--config PATH] [--write-default-config PATH]`

use std::path::PathBuf;

use storefront::startup;
use storefront::{StorefrontConfig, StorefrontServer};
use tracing_subscriber::EnvFilter;

enum Command {
    Serve { config: Option<PathBuf> },
    WriteDefaultConfig(PathBuf),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{arg} requires a path"))?;
                config = Some(PathBuf::from(path));
            }
            "--write-default-config" => {
                let path = args
                    .next()
                    .map(PathBuf::from)
                    .unwrap_or_else(StorefrontConfig::default_config_path);
                return Ok(Command::WriteDefaultConfig(path));
            }
            "-h" | "--help" => return Ok(Command::Help),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(Command::Serve { config })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=info,storefront_catalog=info")),
        )
        .init();

    let config_path = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("usage: storefront [--config PATH] [--write-default-config [PATH]]");
            return Ok(());
        }
        Command::WriteDefaultConfig(path) => {
            StorefrontConfig::default().save_to_file(&path)?;
            println!("wrote {}", path.display());
            return Ok(());
        }
        Command::Serve { config } => config,
    };

    let config = startup::load_config(config_path.as_deref())?;
    let server_config = config.server.clone();
    let storefront = startup::initialize(config).await?;
    let server = StorefrontServer::start(storefront.app_state(), &server_config).await?;

    tracing::info!(addr = %server.addr(), "storefront ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown();
    Ok(())
}
