use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};

use oyster_engine::Engine;
use oyster_engine::config::AppConfig;
use oyster_engine::database::init_db;
use oyster_engine::models::catalog::parse_catalog;

#[derive(Parser)]
#[command(name = "oyster-engine")]
#[command(about = "Operator tools for the oyster rating engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update the database tables
    SyncSchema,
    /// Upsert items from a TOML catalog of [[item]] tables
    ImportCatalog { path: PathBuf },
    /// Re-derive every item's rating
    RecalculateAll,
    /// Re-derive one item's rating
    Recalculate {
        #[arg(long)]
        item: i32,
    },
    /// Print recommendations for a user as JSON
    Recommend {
        #[arg(long)]
        user: i32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a user's credibility summary as JSON
    Credibility {
        #[arg(long)]
        user: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    let engine = Engine::from_config(db, &config);

    match cli.command {
        // Connecting syncs the schema
        Command::SyncSchema => info!("Schema sync complete"),
        Command::ImportCatalog { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let entries = parse_catalog(&text)
                .with_context(|| format!("Invalid catalog file {}", path.display()))?;
            let summary = engine.import_catalog(&entries).await?;
            info!(
                inserted = summary.inserted,
                updated = summary.updated_ids.len(),
                "Import finished"
            );
        }
        Command::RecalculateAll => {
            let processed = engine.recalculate_all_ratings().await?;
            info!(items = processed, "Backfill finished");
        }
        Command::Recalculate { item } => {
            let aggregate = engine.recalculate_item_rating(item).await?;
            println!(
                "item {item}: overall {:.2}, avg rating {:.2}, {} reviews",
                aggregate.overall_score, aggregate.avg_rating, aggregate.review_count
            );
        }
        Command::Recommend { user, limit } => {
            let recommendations = engine.recommend(user, limit).await?;
            println!("{}", serde_json::to_string_pretty(&recommendations)?);
        }
        Command::Credibility { user } => {
            let summary = engine.credibility(user).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
