use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use ulimi::cli::args::{Cli, Commands};
use ulimi::cli::commands::{self, App};
use ulimi::config::ColorSetting;

/// Environment variable holding the log filter, e.g. `ULIMI_LOG=ulimi=debug`.
const LOG_ENV: &str = "ULIMI_LOG";

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let app = App::open(cli.home, cli.offline)
        .await
        .context("failed to open the local store")?;

    match app.config.general.color {
        ColorSetting::Always => colored::control::set_override(true),
        ColorSetting::Never => colored::control::set_override(false),
        ColorSetting::Auto => {},
    }
    let format = cli.output.unwrap_or(app.config.general.default_output);

    let output = match cli.command {
        Commands::Status => commands::status(&app, format)?,
        Commands::List { status } => commands::list_operations(&app, status.as_deref(), format)?,
        Commands::Add {
            operation,
            entity,
            entity_id,
            data,
        } => commands::add_operation(&app, &operation, &entity, &entity_id, data.as_deref(), format)?,
        Commands::Sync => commands::force_sync(&app, format).await?,
        Commands::Retry => commands::retry_failed(&app, format)?,
        Commands::ClearFailed => commands::clear_failed(&app, format)?,
        Commands::Watch => commands::watch(&app, format).await?,
        Commands::Seed => commands::seed(&app, format)?,
        Commands::Get { key } => commands::get_value(&app, &key, format)?,
        Commands::Keys => commands::list_keys(&app, format)?,
        Commands::Config => commands::show_config(&app, format)?,
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
