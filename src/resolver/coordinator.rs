//! Resolution coordinator - main run orchestration logic
//!
//! This module contains the run loop that coordinates all aspects of a
//! resolution run, including:
//! - Loading the catalog and opening a ledger run
//! - Resolving entities concurrently under the entity worker bound
//! - Folding finished resolutions into the catalog and checkpointing it
//! - Handling deadlines and interrupts

use crate::catalog::{Catalog, Entity};
use crate::config::Config;
use crate::locator::{AssetKind, CandidateGenerator, LocatorCandidate, LocatorTemplate, RangeTable};
use crate::merge::apply_resolution;
use crate::output::RunSummary;
use crate::resolver::{
    build_http_client, AssetSource, CounterSnapshot, EntityResolution, Fetcher, HttpAssetSource,
    ProbeCache, Prober, ResolutionOutcome, ResolveError, RunCounters,
};
use crate::state::ResolutionState;
use crate::storage::{
    open_ledger, AssetStore, CatalogStore, FsAssetStore, JsonCatalogStore, RunLedger, RunStatus,
    StorageError, StorageResult,
};
use crate::SweepError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

fn advance(
    states: &mut BTreeMap<AssetKind, ResolutionState>,
    kind: AssetKind,
    next: ResolutionState,
) -> Result<(), ResolveError> {
    states.entry(kind).or_default().transition(next)?;
    Ok(())
}

/// Resolves the asset kinds of a single entity
///
/// Shared by every entity task of a run.
pub struct Resolver {
    generator: CandidateGenerator,
    languages: Vec<String>,
    prober: Prober,
    fetcher: Fetcher,
}

impl Resolver {
    pub fn new(
        generator: CandidateGenerator,
        languages: Vec<String>,
        prober: Prober,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            generator,
            languages,
            prober,
            fetcher,
        }
    }

    /// Resolves every asset kind of an entity
    ///
    /// # Resolution Flow
    ///
    /// 1. Kinds already recorded on the entity are `AlreadyPresent`
    /// 2. Remaining kinds walk the candidate batches in order
    /// 3. Each batch is probed concurrently; per kind the first confirmed
    ///    candidate in selection order wins
    /// 4. The winner is fetched; a failed fetch ends that kind as
    ///    `TransportError` without trying other candidates
    /// 5. Kinds still open after the last batch are `NotFound`
    ///
    /// # Returns
    ///
    /// * `Ok(EntityResolution)` - One outcome per asset kind
    /// * `Err(ResolveError)` - Storage failure or cancellation; nothing
    ///   from this entity should be merged
    pub async fn resolve_entity(
        &self,
        entity: &Entity,
        cancel: &CancellationToken,
    ) -> Result<EntityResolution, ResolveError> {
        let mut resolution = EntityResolution::new(entity.entity_id.clone());
        let mut states = BTreeMap::new();
        let mut pending = Vec::new();

        for kind in AssetKind::ALL {
            match entity.asset_refs.get(kind) {
                Some(path) => {
                    advance(&mut states, kind, ResolutionState::Resolved)?;
                    resolution.outcomes.insert(
                        kind,
                        ResolutionOutcome::AlreadyPresent {
                            path: path.to_string(),
                        },
                    );
                }
                None => {
                    advance(&mut states, kind, ResolutionState::Probing)?;
                    pending.push(kind);
                }
            }
        }

        if pending.is_empty() {
            tracing::debug!("'{}' already has every asset", entity.entity_id);
            return Ok(resolution);
        }

        let batches = self.generator.generate(entity, &self.languages)?;
        let mut cache = ProbeCache::new();

        for batch in &batches {
            if pending.is_empty() {
                break;
            }
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            let candidates: Vec<&LocatorCandidate> = batch
                .candidates
                .iter()
                .filter(|c| pending.contains(&c.kind))
                .collect();
            let found = self.prober.probe_all(&candidates, &mut cache, cancel).await?;

            let mut still_pending = Vec::new();
            for kind in pending {
                let winner = candidates
                    .iter()
                    .zip(&found)
                    .find(|(candidate, exists)| candidate.kind == kind && **exists)
                    .map(|(candidate, _)| *candidate);

                match winner {
                    Some(candidate) => {
                        tracing::debug!(
                            "'{}' {}: {} confirmed in {}",
                            entity.entity_id,
                            kind,
                            candidate.url,
                            batch.tier
                        );
                        let outcome = self.fetcher.fetch(candidate, cancel).await?;
                        advance(&mut states, kind, outcome.state())?;
                        resolution.outcomes.insert(kind, outcome);
                    }
                    None => still_pending.push(kind),
                }
            }
            pending = still_pending;
        }

        for kind in pending {
            advance(&mut states, kind, ResolutionState::Exhausted)?;
            resolution.outcomes.insert(kind, ResolutionOutcome::NotFound);
        }

        resolution.probes = cache.len();
        Ok(resolution)
    }
}

/// Number of candidates an entity would be probed with
#[derive(Debug, Clone)]
pub struct CandidatePlan {
    pub entity_id: String,
    pub missing: Vec<AssetKind>,
    pub candidates: usize,
}

/// Computes the candidate space of every entity without touching the network
pub fn plan_candidates(config: &Config, catalog: &Catalog) -> Result<Vec<CandidatePlan>, SweepError> {
    let template = LocatorTemplate::new(&config.remote.base_url, &config.storage.key_prefix)?;
    let generator = CandidateGenerator::new(template, RangeTable::from_config(config));

    let mut plans = Vec::new();
    for entity in catalog.iter() {
        let missing: Vec<AssetKind> = AssetKind::ALL
            .into_iter()
            .filter(|kind| entity.asset_refs.get(*kind).is_none())
            .collect();
        let candidates = if missing.is_empty() {
            0
        } else {
            let all = generator.candidate_count(entity, &config.resolver.languages)?;
            all / AssetKind::ALL.len() * missing.len()
        };
        plans.push(CandidatePlan {
            entity_id: entity.entity_id.clone(),
            missing,
            candidates,
        });
    }
    Ok(plans)
}

/// Main resolution coordinator
pub struct Coordinator {
    config: Arc<Config>,
    resolver: Arc<Resolver>,
    catalog_store: Arc<dyn CatalogStore>,
    ledger: Box<dyn RunLedger + Send>,
    counters: Arc<RunCounters>,
    cancel: CancellationToken,
    config_hash: String,
    catalog: Catalog,
}

impl Coordinator {
    /// Creates a coordinator backed by HTTP, the filesystem and SQLite
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, stored with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Catalog loaded and ledger opened
    /// * `Err(SweepError)` - Failed to initialize
    pub fn new(config: Config, config_hash: String) -> Result<Self, SweepError> {
        let client = build_http_client(&config.remote)?;
        let source = Arc::new(HttpAssetSource::new(
            client,
            Duration::from_millis(config.resolver.probe_timeout_ms),
            Duration::from_millis(config.resolver.fetch_timeout_ms),
        ));
        let store = Arc::new(FsAssetStore::new(&config.storage.asset_dir));
        let catalog_store = Box::new(JsonCatalogStore::new(&config.storage.catalog_path));
        let ledger = Box::new(open_ledger(Path::new(&config.storage.ledger_path))?);

        Self::with_parts(config, source, store, catalog_store, ledger, config_hash)
    }

    /// Creates a coordinator from explicit backends
    pub fn with_parts(
        config: Config,
        source: Arc<dyn AssetSource>,
        store: Arc<dyn AssetStore>,
        catalog_store: Box<dyn CatalogStore>,
        ledger: Box<dyn RunLedger + Send>,
        config_hash: String,
    ) -> Result<Self, SweepError> {
        let template = LocatorTemplate::new(&config.remote.base_url, &config.storage.key_prefix)?;
        let generator = CandidateGenerator::new(template, RangeTable::from_config(&config));

        let counters = Arc::new(RunCounters::new());
        let prober = Prober::new(
            Arc::clone(&source),
            config.resolver.probe_workers as usize,
            Arc::clone(&counters),
        );
        let fetcher = Fetcher::new(
            source,
            store,
            config.resolver.fetch_workers as usize,
            &config.storage.public_prefix,
            Arc::clone(&counters),
        );
        let resolver = Resolver::new(generator, config.resolver.languages.clone(), prober, fetcher);

        let catalog = catalog_store.load()?;

        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            catalog_store: Arc::from(catalog_store),
            ledger,
            counters,
            cancel: CancellationToken::new(),
            config_hash,
            catalog,
        })
    }

    /// Token that cancels the run when triggered (Ctrl-C, deadline)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Runs one resolution pass over the whole catalog
    ///
    /// Each entity is resolved by its own task; at most `entity-workers`
    /// run at once. Finished entities are merged into the catalog in
    /// completion order, recorded in the ledger, and the catalog is saved
    /// every `checkpoint-every` updated entities and at the end.
    ///
    /// On cancellation no new entities are started, in-flight ones are
    /// abandoned without merging, and the run is marked interrupted.
    pub async fn run(&mut self) -> Result<RunSummary, SweepError> {
        let run_id = self.ledger.create_run(&self.config_hash)?;
        tracing::info!(
            "Starting resolution run {} over {} entities",
            run_id,
            self.catalog.len()
        );

        let deadline = self.config.resolver.deadline_secs.map(|secs| {
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                        tracing::warn!("Run deadline of {}s reached, cancelling", secs);
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            })
        });

        let result = self.drive(run_id).await;

        if let Some(handle) = deadline {
            handle.abort();
        }

        match result {
            Ok(summary) => {
                self.ledger.finish_run(run_id, summary.status)?;
                tracing::info!(
                    "Run {} {}: {} entities updated in {:?}",
                    run_id,
                    summary.status.to_db_string(),
                    summary.counters.entities_updated,
                    summary.duration
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                if let Err(ledger_err) = self.ledger.finish_run(run_id, RunStatus::Failed) {
                    tracing::error!("Could not mark run {} as failed: {}", run_id, ledger_err);
                }
                Err(e)
            }
        }
    }

    async fn drive(&mut self, run_id: i64) -> Result<RunSummary, SweepError> {
        let start_time = Instant::now();
        let total = self.catalog.len();
        let workers = self.config.resolver.entity_workers.max(1) as usize;
        let checkpoint_every = self.config.resolver.checkpoint_every.max(1) as usize;

        let mut set = JoinSet::new();
        let mut next = 0;
        let mut finished = 0;
        let mut since_checkpoint = 0;
        let mut exhausted = Vec::new();
        let mut failed_entities = Vec::new();
        let mut in_flight = HashMap::new();

        loop {
            while set.len() < workers && next < total && !self.cancel.is_cancelled() {
                let position = next;
                next += 1;

                let entity = match self.catalog.entity_at(position) {
                    Some(entity) if !entity.entity_id.trim().is_empty() => entity.clone(),
                    _ => {
                        tracing::warn!("Skipping entity #{} without an id", position);
                        continue;
                    }
                };

                let resolver = Arc::clone(&self.resolver);
                let cancel = self.cancel.clone();
                let entity_id = entity.entity_id.clone();
                let handle = set.spawn(async move {
                    let result = resolver.resolve_entity(&entity, &cancel).await;
                    (position, result)
                });
                in_flight.insert(handle.id(), entity_id);
            }

            let joined = match set.join_next_with_id().await {
                Some(joined) => joined,
                None => break,
            };

            let task_id = match &joined {
                Ok((id, _)) => *id,
                Err(e) => e.id(),
            };
            let entity_id = in_flight.remove(&task_id).unwrap_or_default();

            match joined {
                Ok((_, (position, Ok(resolution)))) => {
                    match self.absorb(run_id, position, &resolution) {
                        Ok(changed) => {
                            if changed {
                                since_checkpoint += 1;
                            }
                            exhausted.extend(
                                resolution
                                    .exhausted_kinds()
                                    .into_iter()
                                    .map(|kind| (resolution.entity_id.clone(), kind)),
                            );
                        }
                        Err(e) => {
                            tracing::warn!("Could not record '{}': {}", entity_id, e);
                            self.counters.entity_failed();
                            failed_entities.push(entity_id);
                        }
                    }
                }
                Ok((_, (_, Err(ResolveError::Cancelled)))) => {
                    tracing::debug!("Resolution of '{}' cancelled", entity_id);
                    continue;
                }
                Ok((_, (_, Err(e)))) => {
                    tracing::error!("Resolution of '{}' failed: {}", entity_id, e);
                    self.counters.entity_failed();
                    failed_entities.push(entity_id);
                }
                Err(e) => {
                    tracing::error!("Entity task for '{}' failed: {}", entity_id, e);
                    self.counters.entity_failed();
                    failed_entities.push(entity_id);
                }
            }

            finished += 1;

            if since_checkpoint >= checkpoint_every && self.checkpoint().await {
                since_checkpoint = 0;
            }

            if finished % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = finished as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} entities, {} probes, {:.2} entities/sec",
                    finished,
                    total,
                    self.counters.snapshot().probes_sent,
                    rate
                );
            }
        }

        let saved = since_checkpoint == 0 || self.checkpoint().await;

        let status = if !saved {
            tracing::error!(
                "Run {} could not save {} updated entities",
                run_id,
                since_checkpoint
            );
            RunStatus::Failed
        } else if self.cancel.is_cancelled() {
            tracing::warn!("Run {} interrupted after {} entities", run_id, finished);
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };

        Ok(RunSummary {
            run_id,
            status,
            entities_total: total,
            counters: self.counters.snapshot(),
            exhausted,
            failed_entities,
            duration: start_time.elapsed(),
        })
    }

    /// Records a finished resolution and merges it into the catalog
    ///
    /// The ledger rows are written first; if that fails the entity is left
    /// untouched and the error is returned for this entity only.
    ///
    /// Returns true if the entity changed.
    fn absorb(
        &mut self,
        run_id: i64,
        position: usize,
        resolution: &EntityResolution,
    ) -> StorageResult<bool> {
        for (kind, outcome) in &resolution.outcomes {
            self.ledger
                .record_outcome(run_id, &resolution.entity_id, *kind, outcome)?;
        }

        self.counters.entity_processed();

        let entity = match self.catalog.entity_at_mut(position) {
            Some(entity) => entity,
            None => return Ok(false),
        };

        let mut changed = false;
        for (kind, outcome) in &resolution.outcomes {
            self.counters.record_outcome(outcome);
            changed |= apply_resolution(entity, *kind, outcome);
        }

        if changed {
            self.counters.entity_updated();
            tracing::debug!("Updated asset refs of '{}'", resolution.entity_id);
        }
        Ok(changed)
    }

    /// Saves a snapshot of the catalog on the blocking pool
    ///
    /// A failed save is logged and counted; the caller retries at the next
    /// checkpoint. Returns true if the catalog was saved.
    async fn checkpoint(&self) -> bool {
        let store = Arc::clone(&self.catalog_store);
        let snapshot = self.catalog.clone();
        let result = tokio::task::spawn_blocking(move || store.save(&snapshot))
            .await
            .unwrap_or_else(|e| {
                Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    e.to_string(),
                )))
            });

        match result {
            Ok(()) => {
                tracing::debug!("Checkpointed catalog ({} entities)", self.catalog.len());
                true
            }
            Err(e) => {
                tracing::warn!("Catalog checkpoint failed: {}", e);
                self.counters.checkpoint_failed();
                false
            }
        }
    }
}

/// Runs a complete resolution pass with the default backends
///
/// Ctrl-C cancels the run; entities merged before the interrupt stay saved.
///
/// # Example
///
/// ```no_run
/// use asset_sweep::config::load_config_with_hash;
/// use asset_sweep::resolver::run_resolve;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("asset-sweep.toml"))?;
/// let summary = run_resolve(config, hash).await?;
/// println!("{} fetched", summary.counters.fetched);
/// # Ok(())
/// # }
/// ```
pub async fn run_resolve(config: Config, config_hash: String) -> Result<RunSummary, SweepError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;

    let cancel = coordinator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            cancel.cancel();
        }
    });

    let result = coordinator.run().await;
    interrupt.abort();
    result
}
