//! Named counters and cumulative timers shared by every analysis stage.
//!
//! A [`Metrics`] value is created fresh for each analysis run and passed by
//! reference into each algorithm. Recording never changes an algorithm's
//! output. Access is serialized through a mutex so the same instance can be
//! shared across threads; readers receive point-in-time copies.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::trace;

#[derive(Debug, Default)]
struct Registry {
    counters: BTreeMap<String, u64>,
    timings: BTreeMap<String, Duration>,
}

/// Accumulator for named counters and named cumulative durations.
#[derive(Debug, Default)]
pub struct Metrics {
    inner: Mutex<Registry>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // A panic while holding the lock cannot leave a half-updated map.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn increment_counter(&self, name: &str) {
        self.add_to_counter(name, 1);
    }

    pub fn add_to_counter(&self, name: &str, delta: u64) {
        let mut registry = self.registry();
        let slot = registry.counters.entry(name.to_string()).or_default();
        *slot = slot.saturating_add(delta);
    }

    /// Current value of a counter, or zero if it was never recorded.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.registry().counters.get(name).copied().unwrap_or(0)
    }

    pub fn add_time(&self, name: &str, elapsed: Duration) {
        let mut registry = self.registry();
        let slot = registry.timings.entry(name.to_string()).or_default();
        *slot = slot.saturating_add(elapsed);
    }

    /// Accumulated duration of a timer, or zero if it was never recorded.
    #[must_use]
    pub fn time_of(&self, name: &str) -> Duration {
        self.registry()
            .timings
            .get(name)
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Start timing `name`; the elapsed time is added when the guard drops.
    #[must_use = "the timer records when the guard is dropped"]
    pub fn time<'a>(&'a self, name: &'a str) -> TimerGuard<'a> {
        TimerGuard {
            metrics: self,
            name,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn counters(&self) -> BTreeMap<String, u64> {
        self.registry().counters.clone()
    }

    #[must_use]
    pub fn timings(&self) -> BTreeMap<String, Duration> {
        self.registry().timings.clone()
    }

    /// Copy of all counters and timers taken under a single lock.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let registry = self.registry();
        MetricsSnapshot {
            counters: registry.counters.clone(),
            timings: registry.timings.clone(),
        }
    }
}

/// Scoped timer returned by [`Metrics::time`].
///
/// Dropping the guard adds the elapsed time to its timer exactly once, on
/// every exit path including `?` returns and unwinding.
#[derive(Debug)]
pub struct TimerGuard<'a> {
    metrics: &'a Metrics,
    name: &'a str,
    started: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        trace!(timer = self.name, ?elapsed, "timer recorded");
        self.metrics.add_time(self.name, elapsed);
    }
}

/// Point-in-time copy of a [`Metrics`] registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub timings: BTreeMap<String, Duration>,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.timings.is_empty()
    }

    /// Render the snapshot as JSON (`timings` in nanoseconds).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let timings: BTreeMap<&str, u64> = self
            .timings
            .iter()
            .map(|(name, elapsed)| {
                let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
                (name.as_str(), nanos)
            })
            .collect();

        json!({
            "counters": self.counters,
            "timings_ns": timings,
        })
    }

    /// Render the snapshot as a simple table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.is_empty() {
            return "No metrics recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("metric                       value\n");
        out.push_str("----------------------------------------\n");

        for (name, value) in &self.counters {
            out.push_str(&format!("{name:<28} {value:>10}\n"));
        }
        for (name, elapsed) in &self.timings {
            out.push_str(&format!("{name:<28} {:>10}\n", format_duration(*elapsed)));
        }

        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else if micros > 0 {
        format!("{micros}µs")
    } else {
        format!("{}ns", duration.as_nanos())
    }
}
