//! Fetching and persisting confirmed assets

use crate::locator::LocatorCandidate;
use crate::resolver::{AssetSource, ResolutionOutcome, ResolveError, RunCounters};
use crate::storage::AssetStore;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Downloads a confirmed candidate into the asset store, at most once
pub struct Fetcher {
    source: Arc<dyn AssetSource>,
    store: Arc<dyn AssetStore>,
    semaphore: Arc<Semaphore>,
    public_prefix: String,
    counters: Arc<RunCounters>,
}

impl Fetcher {
    pub fn new(
        source: Arc<dyn AssetSource>,
        store: Arc<dyn AssetStore>,
        workers: usize,
        public_prefix: &str,
        counters: Arc<RunCounters>,
    ) -> Self {
        Self {
            source,
            store,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            counters,
        }
    }

    /// Path recorded in the catalog for a storage key
    pub fn public_path(&self, storage_key: &str) -> String {
        format!("{}/{}", self.public_prefix, storage_key)
    }

    /// Fetches one candidate
    ///
    /// # Request Flow
    ///
    /// 1. If the store already holds the key → `AlreadyPresent`, no request
    /// 2. GET the candidate URL under the fetch semaphore
    /// 3. Persist the bytes atomically → `Fetched`
    ///
    /// A failed download is reported as `TransportError` and never retried.
    ///
    /// # Returns
    ///
    /// * `Ok(ResolutionOutcome)` - The outcome for this candidate
    /// * `Err(ResolveError::Storage)` - The asset store failed
    /// * `Err(ResolveError::Cancelled)` - The run was cancelled
    pub async fn fetch(
        &self,
        candidate: &LocatorCandidate,
        cancel: &CancellationToken,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let path = self.public_path(&candidate.storage_key);

        if self.store.exists(&candidate.storage_key).await? {
            tracing::debug!("{} already stored", candidate.storage_key);
            return Ok(ResolutionOutcome::AlreadyPresent { path });
        }

        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                permit.map_err(|_| ResolveError::Cancelled)?
            }
        };

        self.counters.fetch_requested();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.source.fetch(&candidate.url) => result,
        };

        match result {
            Ok(bytes) => {
                self.store.put(&candidate.storage_key, &bytes).await?;
                tracing::info!(
                    "Fetched {} ({} bytes) -> {}",
                    candidate.url,
                    bytes.len(),
                    path
                );
                Ok(ResolutionOutcome::Fetched { path })
            }
            Err(failure) => {
                tracing::warn!("Failed to fetch {}: {}", candidate.url, failure);
                Ok(ResolutionOutcome::TransportError {
                    url: candidate.url.clone(),
                    reason: failure.to_string(),
                })
            }
        }
    }
}
