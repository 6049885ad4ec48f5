use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pushwire::infrastructure::{AppConfig, CliArgs, StorageManager};
use pushwire::presentation::{Cli, terminal_prompt};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<(AppConfig, Option<StorageManager>)> {
    let storage = StorageManager::new().ok();

    let mut config = match &storage {
        Some(storage) => storage.load_config(args.config.as_deref())?,
        None => AppConfig::default(),
    };
    config.merge_with_args(args);

    Ok((config, storage))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let (config, storage) = load_config(&args)?;

    init_logging(&config)?;

    info!(version = pushwire::VERSION, api_url = %config.api_url, "Starting Pushwire");
    if storage.is_none() {
        warn!("No configuration directory available, push is unsupported");
    }
    if config.vapid_key.is_empty() {
        warn!("No application server key configured");
    }

    let mut cli = Cli::new(config, storage, terminal_prompt(), std::io::stdout());
    cli.run(args.command).await
}
