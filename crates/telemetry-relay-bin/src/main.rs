//! Telemetry relay - delivers telemetry events and replays the ones that failed.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use telemetry_config_and_utils::{init_logging, Config, Paths};

/// Telemetry relay command-line interface.
#[derive(Parser)]
#[command(name = "telemetry-relay")]
#[command(about = "Deliver telemetry events, caching failures for later replay")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, database, logs). Defaults to ~/.telemetry-relay
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one event now; cache it if delivery fails
    Send {
        /// Event body as a JSON object
        #[arg(short, long)]
        payload: String,

        /// Event id. Taken from the payload's `event_id`, or generated, when omitted
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Replay one batch of cached events
    Flush,
    /// Show cached events awaiting delivery
    Pending {
        /// Maximum number of ids to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Replay cached events on a timer until interrupted
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level, config.log_format);

    match cli.command {
        Commands::Send { payload, event_id } => {
            app::send(&config, &paths, &payload, event_id).await?;
        }
        Commands::Flush => {
            app::flush(&config, &paths).await?;
        }
        Commands::Pending { limit } => {
            app::pending(&config, &paths, limit).await?;
        }
        Commands::Run => {
            app::run(&config, &paths).await?;
        }
    }

    Ok(())
}
