//! Thin metrics counters.
//!
//! Plain atomics behind an `Arc`; a scrape endpoint or periodic log line can
//! snapshot them. Deliberately not a metrics framework.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters for the hot paths.
#[derive(Debug, Default)]
pub struct Metrics {
    registrations_total: AtomicU64,
    waitlisted_total: AtomicU64,
    promotions_total: AtomicU64,
    cancellations_total: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    outbox_processed: AtomicU64,
    outbox_failed_attempts: AtomicU64,
    outbox_dead_lettered: AtomicU64,
}

/// Point-in-time view of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub registrations_total: u64,
    pub waitlisted_total: u64,
    pub promotions_total: u64,
    pub cancellations_total: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub outbox_processed: u64,
    pub outbox_failed_attempts: u64,
    pub outbox_dead_lettered: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_registrations(&self) {
        self.registrations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_waitlisted(&self) {
        self.waitlisted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_promotions(&self, n: u64) {
        self.promotions_total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn incr_cancellations(&self) {
        self.cancellations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_outbox_processed(&self) {
        self.outbox_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_outbox_failed_attempt(&self) {
        self.outbox_failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_outbox_dead_lettered(&self) {
        self.outbox_dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations_total: self.registrations_total.load(Ordering::Relaxed),
            waitlisted_total: self.waitlisted_total.load(Ordering::Relaxed),
            promotions_total: self.promotions_total.load(Ordering::Relaxed),
            cancellations_total: self.cancellations_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            outbox_processed: self.outbox_processed.load(Ordering::Relaxed),
            outbox_failed_attempts: self.outbox_failed_attempts.load(Ordering::Relaxed),
            outbox_dead_lettered: self.outbox_dead_lettered.load(Ordering::Relaxed),
        }
    }
}
