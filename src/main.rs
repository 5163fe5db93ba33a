//! Magazine - schema management for the magazine data layer

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magazine::{config::Config, db, media::MediaStorage};

#[derive(Parser, Debug)]
#[command(name = "magazine")]
#[command(about = "Manage the magazine database schema")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply all pending migrations
    Migrate,
    /// Revert applied migrations newer than the target version
    Rollback {
        /// Version to roll back to (0 reverts everything)
        #[arg(long)]
        to: i32,
    },
    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magazine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load_with_env(&cli.config)?;
    tracing::info!("Configuration loaded from {}", cli.config.display());

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    match cli.command {
        Command::Migrate => {
            let applied = db::migrations::run_migrations(&pool).await?;
            tracing::info!("Applied {} migration(s)", applied);
        }
        Command::Rollback { to } => {
            let reverted = db::migrations::rollback_to(&pool, to).await?;
            let current = db::migrations::current_version(&pool).await?;
            tracing::info!(
                "Reverted {} migration(s), now at version {}",
                reverted,
                current
            );
        }
        Command::Status => {
            let applied = db::migrations::get_applied_migrations(&pool).await?;
            for record in &applied {
                println!(
                    "{:>4}  {:<40} {}",
                    record.version,
                    record.name,
                    record.applied_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            println!(
                "{} applied, {} pending, {} total",
                applied.len(),
                db::migrations::pending_count(&pool).await?,
                db::migrations::total_migrations()
            );

            let storage = MediaStorage::from_config(&config.media);
            println!(
                "media stored in {} and served from {}",
                storage.root().display(),
                storage.url_for("")
            );
        }
    }

    pool.close().await;
    Ok(())
}
