// src/orchestrator.rs
//
// Runs the entity loaders as an explicit ordered pipeline of blocking
// stages: Cities -> Properties -> Rooms -> RateSnapshots -> Reviews ->
// ReputationKPI. Each stage finishes before the next starts so the
// dependent stages' id maps always see the prior stage's insertions.

use crate::config::AppConfig;
use crate::data_model::RunSummary;
use crate::error::{EtlError, Result};
use crate::pipeline::loaders::{
    CityLoader, LoaderContext, PropertyLoader, RateLoader, ReputationLoader, ReviewLoader,
    RoomLoader,
};
use crate::pipeline::translate::CityTranslator;
use crate::rejects::RejectSink;
use crate::store::DocumentStore;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The loadable entity types, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Cities,
    Properties,
    Rooms,
    Rates,
    Reviews,
    Reputation,
}

impl Entity {
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Cities => "city",
            Entity::Properties => "property",
            Entity::Rooms => "room",
            Entity::Rates => "rate_snapshot",
            Entity::Reviews => "review",
            Entity::Reputation => "reputation_kpi",
        }
    }
}

/// Raw input files for a full run; stages without a file are skipped.
#[derive(Debug, Clone, Default)]
pub struct RunPaths {
    pub cities: Option<PathBuf>,
    pub properties: Option<PathBuf>,
    pub rooms: Option<PathBuf>,
    pub rates: Option<PathBuf>,
    pub reviews: Option<PathBuf>,
}

/// Executes every provided stage in dependency order. Row-level failures
/// never halt the run; a stage returning an error (invalid input file,
/// sustained store failure) aborts the remaining stages.
pub async fn run_all(
    cfg: &AppConfig,
    store: &dyn DocumentStore,
    rejects: &RejectSink,
    paths: &RunPaths,
) -> Result<RunSummary> {
    info!(
        database = %cfg.database,
        batch_size = cfg.batch_size,
        "run started"
    );
    let ctx = LoaderContext {
        store,
        rejects,
        batch_size: cfg.batch_size,
    };
    let mut translator = CityTranslator::new(
        &cfg.target_language,
        cfg.translate_endpoint.as_deref(),
    );
    let mut summary = RunSummary::default();

    if let Some(path) = &paths.cities {
        let stats =
            CityLoader::run(&ctx, path, &mut translator, &cfg.source_locale).await?;
        summary.push(Entity::Cities.name(), stats);
    }
    if let Some(path) = &paths.properties {
        let stats =
            PropertyLoader::run(&ctx, path, &mut translator, &cfg.source_locale).await?;
        summary.push(Entity::Properties.name(), stats);
    }
    if let Some(path) = &paths.rooms {
        summary.push(Entity::Rooms.name(), RoomLoader::run(&ctx, path).await?);
    }
    if let Some(path) = &paths.rates {
        summary.push(Entity::Rates.name(), RateLoader::run(&ctx, path).await?);
    }
    if let Some(path) = &paths.reviews {
        summary.push(Entity::Reviews.name(), ReviewLoader::run(&ctx, path).await?);
    }
    // Aggregates are recomputed from the store, so this stage always runs.
    summary.push(Entity::Reputation.name(), ReputationLoader::run(&ctx).await?);

    if summary.degraded() {
        warn!("run finished degraded: some batches reported store failures");
    }
    info!(degraded = summary.degraded(), "run finished");
    Ok(summary)
}

/// Executes a single entity loader. Raw-input entities require a file path;
/// the reputation aggregation derives everything from the store.
pub async fn run_entity(
    cfg: &AppConfig,
    store: &dyn DocumentStore,
    rejects: &RejectSink,
    entity: Entity,
    path: Option<&Path>,
) -> Result<RunSummary> {
    let ctx = LoaderContext {
        store,
        rejects,
        batch_size: cfg.batch_size,
    };
    let mut translator = CityTranslator::new(
        &cfg.target_language,
        cfg.translate_endpoint.as_deref(),
    );
    let require_path = || {
        path.ok_or_else(|| {
            EtlError::Config(format!("entity '{}' requires an input file", entity.name()))
        })
    };

    let stats = match entity {
        Entity::Cities => {
            CityLoader::run(&ctx, require_path()?, &mut translator, &cfg.source_locale).await?
        }
        Entity::Properties => {
            PropertyLoader::run(&ctx, require_path()?, &mut translator, &cfg.source_locale)
                .await?
        }
        Entity::Rooms => RoomLoader::run(&ctx, require_path()?).await?,
        Entity::Rates => RateLoader::run(&ctx, require_path()?).await?,
        Entity::Reviews => ReviewLoader::run(&ctx, require_path()?).await?,
        Entity::Reputation => ReputationLoader::run(&ctx).await?,
    };
    let mut summary = RunSummary::default();
    summary.push(entity.name(), stats);
    Ok(summary)
}
