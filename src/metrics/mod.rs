//! Metrics collection module
//!
//! Tracks provider response times, failure rates, and run counts in memory.

use crate::search::ProviderId;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Response times kept per provider
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    searches: u64,
    successes: u64,
    failures: u64,
    response_times: VecDeque<u64>,
}

/// Process-wide metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    total_runs: AtomicU64,
    providers: RwLock<HashMap<ProviderId, ProviderCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total run count
    pub fn inc_run(&self) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a provider unit started
    pub fn record_provider_search(&self, provider: ProviderId) {
        self.update(provider, |c| c.searches += 1);
    }

    /// Record a successful adapter call and its latency
    pub fn record_success(&self, provider: ProviderId, elapsed: Duration) {
        self.update(provider, |c| {
            c.successes += 1;
            push_time(c, elapsed);
        });
    }

    /// Record a failed adapter call (transport, protocol, timeout or panic)
    pub fn record_failure(&self, provider: ProviderId, elapsed: Duration) {
        self.update(provider, |c| {
            c.failures += 1;
            push_time(c, elapsed);
        });
    }

    pub fn get_total_runs(&self) -> u64 {
        self.total_runs.load(Ordering::Relaxed)
    }

    /// Average response time over the recent window, in milliseconds
    pub fn get_avg_response_time(&self, provider: ProviderId) -> Option<u64> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.get(&provider).and_then(avg_time)
    }

    /// Share of successful adapter calls, as a percentage
    pub fn get_reliability(&self, provider: ProviderId) -> f64 {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.get(&provider).map(reliability).unwrap_or(100.0)
    }

    /// Snapshot of every provider seen so far
    pub fn stats(&self) -> HashMap<ProviderId, ProviderStats> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers
            .iter()
            .map(|(id, c)| {
                (
                    *id,
                    ProviderStats {
                        searches: c.searches,
                        failures: c.failures,
                        avg_response_time: avg_time(c),
                        reliability: reliability(c),
                    },
                )
            })
            .collect()
    }

    fn update<F: FnOnce(&mut ProviderCounters)>(&self, provider: ProviderId, f: F) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        f(providers.entry(provider).or_default());
    }
}

fn push_time(counters: &mut ProviderCounters, elapsed: Duration) {
    if counters.response_times.len() >= RESPONSE_WINDOW {
        counters.response_times.pop_front();
    }
    counters.response_times.push_back(elapsed.as_millis() as u64);
}

fn avg_time(counters: &ProviderCounters) -> Option<u64> {
    let times = &counters.response_times;
    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<u64>() / times.len() as u64)
    }
}

fn reliability(counters: &ProviderCounters) -> f64 {
    let total = counters.successes + counters.failures;
    if total == 0 {
        100.0
    } else {
        (counters.successes as f64 / total as f64) * 100.0
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStats {
    pub searches: u64,
    pub failures: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}
