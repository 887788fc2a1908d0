// src/bin/seeder.rs

//! # Seeder Binary
//!
//! Command-line entry point for loading the flat hospitality exports
//! (cities, properties, rooms, rate snapshots, reviews) into the document
//! store as normalized collections.
//!
//! Subcommands:
//!
//! 1. **run-all**: executes the full orchestrated pipeline in dependency
//!    order; stages without an input file are skipped.
//! 2. **run**: executes a single entity loader.
//! 3. **preflight**: verifies connectivity and ensures the unique
//!    natural-key indexes exist.
//! 4. **purge**: empties (optionally drops) managed collections, used to
//!    reset state between test runs.
//!
//! Configuration comes from the environment (`.env` supported): `MONGO_URI`,
//! `MONGO_DB`, `MONGO_BATCH_SIZE`, `TARGET_LANG`, `SOURCE_LOCALE`,
//! `TRANSLATE_ENDPOINT`, `REJECT_DIR`. A completed run exits 0 even when
//! rows were rejected; only fatal conditions (invalid configuration,
//! unreachable store, unreadable input file) exit non-zero.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};
use StaySeeder::config::AppConfig;
use StaySeeder::data_model::RunSummary;
use StaySeeder::error::Result;
use StaySeeder::maintenance;
use StaySeeder::orchestrator::{self, Entity, RunPaths};
use StaySeeder::rejects::RejectSink;
use StaySeeder::store::MongoStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hospitality snapshot loader", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every loader in dependency order; stages without a file are skipped.
    RunAll {
        /// City metadata input file (JSON or CSV).
        #[arg(long)]
        cities: Option<PathBuf>,
        /// Property listings input file.
        #[arg(long)]
        properties: Option<PathBuf>,
        /// Room inventory input file.
        #[arg(long)]
        rooms: Option<PathBuf>,
        /// Best-available-rate snapshots input file.
        #[arg(long)]
        rates: Option<PathBuf>,
        /// Guest reviews input file.
        #[arg(long)]
        reviews: Option<PathBuf>,
    },
    /// Run a single entity loader.
    Run {
        /// Entity to load.
        #[arg(value_enum)]
        entity: EntityArg,
        /// Input file; not used by `reputation`, which derives from the store.
        file: Option<PathBuf>,
    },
    /// Verify connectivity and ensure the unique natural-key indexes.
    Preflight,
    /// Remove all documents from the named managed collections.
    Purge {
        /// Collection names (e.g. Properties Rooms).
        #[arg(required = true)]
        collections: Vec<String>,
        /// Also drop the collections after emptying them.
        #[arg(long)]
        drop: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EntityArg {
    Cities,
    Properties,
    Rooms,
    Rates,
    Reviews,
    Reputation,
}

impl From<EntityArg> for Entity {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::Cities => Entity::Cities,
            EntityArg::Properties => Entity::Properties,
            EntityArg::Rooms => Entity::Rooms,
            EntityArg::Rates => Entity::Rates,
            EntityArg::Reviews => Entity::Reviews,
            EntityArg::Reputation => Entity::Reputation,
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{:<16} {:>9} {:>9} {:>8} {:>9}",
        "entity", "inserted", "replaced", "skipped", "rejected"
    );
    for stage in &summary.stages {
        println!(
            "{:<16} {:>9} {:>9} {:>8} {:>9}",
            stage.entity,
            stage.stats.inserted,
            stage.stats.replaced,
            stage.stats.skipped,
            stage.stats.rejected
        );
    }
    if summary.degraded() {
        println!("warning: run degraded, some batches reported store failures");
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = AppConfig::from_env()?;
    let store = MongoStore::connect(&cfg).await?;

    match cli.command {
        Command::RunAll {
            cities,
            properties,
            rooms,
            rates,
            reviews,
        } => {
            let rejects = RejectSink::open(&cfg.reject_dir)?;
            let paths = RunPaths {
                cities,
                properties,
                rooms,
                rates,
                reviews,
            };
            let summary = orchestrator::run_all(&cfg, &store, &rejects, &paths).await?;
            print_summary(&summary);
        }
        Command::Run { entity, file } => {
            let rejects = RejectSink::open(&cfg.reject_dir)?;
            let summary = orchestrator::run_entity(
                &cfg,
                &store,
                &rejects,
                entity.into(),
                file.as_deref(),
            )
            .await?;
            print_summary(&summary);
        }
        Command::Preflight => {
            maintenance::preflight(&store).await?;
            println!("preflight ok: store reachable, natural-key indexes in place");
        }
        Command::Purge { collections, drop } => {
            let deleted = maintenance::purge(&store, &collections, drop).await?;
            println!("purged {} document(s) from {} collection(s)", deleted, collections.len());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "fatal");
        eprintln!("fatal: {}", e);
        std::process::exit(1);
    }
}
