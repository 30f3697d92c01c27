//! # GreenThumb CLI (`greenthumb`)
//!
//! ## Usage
//!
//! ```bash
//! greenthumb --config ./config/greenthumb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `greenthumb init` | Create the SQLite database and seed the plant catalog |
//! | `greenthumb plants` | List all plants |
//! | `greenthumb show <id>` | Show one plant |
//! | `greenthumb refresh` | Fetch remote config and apply plant descriptions |
//! | `greenthumb config` | Show the active remote config |
//! | `greenthumb rate [choice]` | Show or save the gardening experience rating |
//! | `greenthumb link <url>` | Open the plant a deep link points to |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `greenthumb=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use greenthumb::{config, config_status, deep_link, migrate, plants, preferences, refresh};

/// GreenThumb — a plant catalog with remotely configured descriptions.
#[derive(Parser)]
#[command(
    name = "greenthumb",
    about = "GreenThumb — a plant catalog with remotely configured descriptions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/greenthumb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and seed the plant catalog.
    ///
    /// Idempotent: existing plants are left untouched.
    Init,

    /// List all plants.
    Plants,

    /// Show a single plant.
    Show {
        /// Plant id.
        id: i64,
    },

    /// Fetch remote config and apply plant descriptions.
    ///
    /// A failed fetch is reported but does not fail the command; the
    /// descriptions are applied from the current configuration.
    Refresh {
        /// Ignore the cache expiration and always contact the source.
        #[arg(long)]
        force: bool,
    },

    /// Show the active remote config and the last fetch status.
    Config,

    /// Show or save your gardening experience rating.
    Rate {
        /// Rating index (0 = Beginner … 4 = Expert). Omit to list the choices.
        #[arg(allow_negative_numbers = true)]
        choice: Option<i64>,
    },

    /// Open the plant a deep link points to.
    Link {
        /// Deep link URL; its last path segment is the plant id.
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("greenthumb=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Plants => {
            plants::run_list(&cfg).await?;
        }
        Commands::Show { id } => {
            plants::run_show(&cfg, id).await?;
        }
        Commands::Refresh { force } => {
            refresh::run_refresh(&cfg, force).await?;
        }
        Commands::Config => {
            config_status::run_config_status(&cfg).await?;
        }
        Commands::Rate { choice } => {
            preferences::run_rate(&cfg, choice).await?;
        }
        Commands::Link { url } => {
            deep_link::run_link(&cfg, &url).await?;
        }
    }

    Ok(())
}
