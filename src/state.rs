use crate::config::AppConfig;
use crate::feeds::PriceSource;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Request Counters (lock-free) ──

pub struct PerfCounters {
    pub requests_received: AtomicU64,
    pub series_fetched: AtomicU64,
    pub analyses_completed: AtomicU64,
    pub client_errors: AtomicU64,
    pub server_errors: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            series_fetched: AtomicU64::new(0),
            analyses_completed: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        use Ordering::Relaxed;
        CountersSnapshot {
            requests_received: self.requests_received.load(Relaxed),
            series_fetched: self.series_fetched.load(Relaxed),
            analyses_completed: self.analyses_completed.load(Relaxed),
            client_errors: self.client_errors.load(Relaxed),
            server_errors: self.server_errors.load(Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CountersSnapshot {
    pub requests_received: u64,
    pub series_fetched: u64,
    pub analyses_completed: u64,
    pub client_errors: u64,
    pub server_errors: u64,
}

// ── Shared App State ──

/// Read-only per-process dependencies. Every request computes from
/// scratch; nothing here caches prices or results.
pub struct AppState {
    pub config: AppConfig,
    pub source: Arc<dyn PriceSource>,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn PriceSource>) -> Arc<Self> {
        Arc::new(Self {
            config,
            source,
            counters: PerfCounters::new(),
        })
    }

    #[inline]
    pub fn is_listed(&self, symbol: &str) -> bool {
        self.config.symbols.iter().any(|s| s == symbol)
    }
}
