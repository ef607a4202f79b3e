//! Run-scoped outcome counters shared between resolver tasks

use crate::resolver::ResolutionOutcome;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated by probe, fetch and coordinator tasks
#[derive(Debug, Default)]
pub struct RunCounters {
    probes_sent: AtomicU64,
    fetch_requests: AtomicU64,
    fetched: AtomicU64,
    already_present: AtomicU64,
    not_found: AtomicU64,
    transport_failed: AtomicU64,
    entities_processed: AtomicU64,
    entities_updated: AtomicU64,
    entities_failed: AtomicU64,
    checkpoints_failed: AtomicU64,
}

/// Point-in-time copy of [`RunCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub probes_sent: u64,
    pub fetch_requests: u64,
    pub fetched: u64,
    pub already_present: u64,
    pub not_found: u64,
    pub transport_failed: u64,
    pub entities_processed: u64,
    pub entities_updated: u64,
    pub entities_failed: u64,
    pub checkpoints_failed: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe_sent(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_requested(&self) {
        self.fetch_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &ResolutionOutcome) {
        let counter = match outcome {
            ResolutionOutcome::Fetched { .. } => &self.fetched,
            ResolutionOutcome::AlreadyPresent { .. } => &self.already_present,
            ResolutionOutcome::NotFound => &self.not_found,
            ResolutionOutcome::TransportError { .. } => &self.transport_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entity_processed(&self) {
        self.entities_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entity_updated(&self) {
        self.entities_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entity_failed(&self) {
        self.entities_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn checkpoint_failed(&self) {
        self.checkpoints_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            probes_sent: self.probes_sent.load(Ordering::Relaxed),
            fetch_requests: self.fetch_requests.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            already_present: self.already_present.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            transport_failed: self.transport_failed.load(Ordering::Relaxed),
            entities_processed: self.entities_processed.load(Ordering::Relaxed),
            entities_updated: self.entities_updated.load(Ordering::Relaxed),
            entities_failed: self.entities_failed.load(Ordering::Relaxed),
            checkpoints_failed: self.checkpoints_failed.load(Ordering::Relaxed),
        }
    }
}
