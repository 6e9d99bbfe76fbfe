use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use konsult::admin_cli::{handle_admin_command, AdminCli};
use konsult::app_log;
use konsult::{start_web_server, ConfigManager};
use std::fs::OpenOptions;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "konsult")]
#[command(about = "Consultancy website backend: public pages, resume editor, CMS and SEO audits")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server (default)
    Serve,
    /// Administration tasks on the local database
    Admin(AdminCli),
}

fn init_logging() -> Result<()> {
    // Optional JSON copy of the logs, cleared on startup
    let file_layer = match std::env::var("LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("konsult=info,rocket=warn")),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let config = ConfigManager::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let port = match std::env::var("ROCKET_PORT") {
                Ok(value) => value
                    .parse::<u16>()
                    .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?,
                Err(_) => 8000,
            };

            app_log!(info, "Environment: {}", config.environment_name);
            app_log!(info, "Server: http://0.0.0.0:{}", port);

            start_web_server(config, port).await
        }
        Command::Admin(admin) => handle_admin_command(admin, config).await,
    }
}
