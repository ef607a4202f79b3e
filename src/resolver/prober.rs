//! Concurrent existence probing
//!
//! A single `Prober` is shared by every entity task in a run, so its
//! semaphore is the run-wide probe ceiling. Results are collected as the
//! probes complete and handed back aligned with the input order, which keeps
//! selection independent of completion order.

use crate::locator::LocatorCandidate;
use crate::resolver::{AssetSource, ResolveError, RunCounters};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Probe results already known for one entity in the current run
#[derive(Debug, Default)]
pub struct ProbeCache {
    results: HashMap<String, bool>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<bool> {
        self.results.get(url).copied()
    }

    pub fn insert(&mut self, url: String, exists: bool) {
        self.results.insert(url, exists);
    }

    /// Number of distinct URLs probed
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs existence probes under a fixed concurrency ceiling
pub struct Prober {
    source: Arc<dyn AssetSource>,
    semaphore: Arc<Semaphore>,
    counters: Arc<RunCounters>,
}

impl Prober {
    pub fn new(source: Arc<dyn AssetSource>, workers: usize, counters: Arc<RunCounters>) -> Self {
        Self {
            source,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            counters,
        }
    }

    /// Probes a batch of candidates concurrently
    ///
    /// URLs already in `cache` are not probed again. The returned vector is
    /// aligned with `candidates`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<bool>)` - Existence of each candidate
    /// * `Err(ResolveError::Cancelled)` - The run was cancelled mid-batch
    pub async fn probe_all(
        &self,
        candidates: &[&LocatorCandidate],
        cache: &mut ProbeCache,
        cancel: &CancellationToken,
    ) -> Result<Vec<bool>, ResolveError> {
        let mut scheduled = HashSet::new();
        let mut set = JoinSet::new();

        for candidate in candidates {
            if cache.get(&candidate.url).is_some() || !scheduled.insert(candidate.url.clone()) {
                continue;
            }

            let url = candidate.url.clone();
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&self.semaphore);
            let counters = Arc::clone(&self.counters);
            let cancel = cancel.clone();

            set.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (url, None),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (url, None),
                    },
                };

                counters.probe_sent();
                let exists = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    exists = source.exists(&url) => Some(exists),
                };
                (url, exists)
            });
        }

        let mut cancelled = false;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((url, Some(exists))) => cache.insert(url, exists),
                Ok((_, None)) => cancelled = true,
                Err(e) => tracing::warn!("Probe task failed: {}", e),
            }
        }

        if cancelled || cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        Ok(candidates
            .iter()
            .map(|c| cache.get(&c.url).unwrap_or(false))
            .collect())
    }
}
