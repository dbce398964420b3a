//! Shared application state
//!
//! Holds the message parser used by every request plus the counters and the
//! latency histogram reported by `/status`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::extraction::{MessageInfo, MessageParser};

/// Request latency percentile metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// 50th percentile (median) latency in milliseconds
    pub p50_ms: f64,

    /// 95th percentile latency in milliseconds
    pub p95_ms: f64,

    /// 99th percentile latency in milliseconds
    pub p99_ms: f64,

    /// Total number of requests recorded
    pub total_requests: u64,

    /// Mean latency in milliseconds
    pub mean_ms: f64,

    /// Maximum latency recorded in milliseconds
    pub max_ms: f64,
}

/// Thread-safe latency histogram for parse request timings.
///
/// Tracks 1us to 60s with 3 significant figures.
#[derive(Debug)]
pub struct LatencyHistogram {
    inner: RwLock<Histogram<u64>>,
}

impl LatencyHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        let histogram =
            Histogram::new_with_bounds(1, 60_000_000, 3).expect("histogram bounds are valid");
        Self {
            inner: RwLock::new(histogram),
        }
    }

    /// Record a latency in microseconds. Out-of-range values are dropped.
    pub fn record(&self, latency_us: u64) {
        let _ = self.inner.write().record(latency_us.max(1));
    }

    /// Record a latency duration.
    pub fn record_duration(&self, duration: Duration) {
        self.record(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX));
    }

    /// Number of recorded values.
    pub fn count(&self) -> u64 {
        self.inner.read().len()
    }

    /// Percentiles converted to milliseconds.
    pub fn metrics(&self) -> LatencyMetrics {
        let hist = self.inner.read();
        LatencyMetrics {
            p50_ms: hist.value_at_percentile(50.0) as f64 / 1000.0,
            p95_ms: hist.value_at_percentile(95.0) as f64 / 1000.0,
            p99_ms: hist.value_at_percentile(99.0) as f64 / 1000.0,
            total_requests: hist.len(),
            mean_ms: hist.mean() / 1000.0,
            max_ms: hist.max() as f64 / 1000.0,
        }
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application state.
///
/// Counters are lock-free atomics; the histogram sits behind an `RwLock`.
#[derive(Debug)]
pub struct AppState {
    parser: MessageParser,
    start_time: Instant,
    messages_parsed: AtomicU64,
    links_resolved: AtomicU64,
    links_fallback: AtomicU64,
    error_count: AtomicU64,
    latency_histogram: LatencyHistogram,
}

impl AppState {
    /// Create state around a configured parser.
    pub fn new(parser: MessageParser) -> Self {
        Self {
            parser,
            start_time: Instant::now(),
            messages_parsed: AtomicU64::new(0),
            links_resolved: AtomicU64::new(0),
            links_fallback: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            latency_histogram: LatencyHistogram::new(),
        }
    }

    /// The shared message parser.
    #[inline]
    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    /// Server uptime in seconds.
    #[inline]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Account for one parsed message and how long it took.
    pub fn record_parse(&self, info: &MessageInfo, elapsed: Duration) {
        let fallback = info.links.iter().filter(|l| l.is_fallback()).count() as u64;
        let total = info.links.len() as u64;

        self.messages_parsed.fetch_add(1, Ordering::Relaxed);
        self.links_resolved.fetch_add(total - fallback, Ordering::Relaxed);
        self.links_fallback.fetch_add(fallback, Ordering::Relaxed);
        self.latency_histogram.record_duration(elapsed);
    }

    /// Total messages parsed.
    #[inline]
    pub fn messages_parsed(&self) -> u64 {
        self.messages_parsed.load(Ordering::Relaxed)
    }

    /// Links that came back with a real page title.
    #[inline]
    pub fn links_resolved(&self) -> u64 {
        self.links_resolved.load(Ordering::Relaxed)
    }

    /// Links reported with the fallback title.
    #[inline]
    pub fn links_fallback(&self) -> u64 {
        self.links_fallback.load(Ordering::Relaxed)
    }

    /// Record a request error and return the new total.
    #[inline]
    pub fn record_error(&self) -> u64 {
        self.error_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Total request errors.
    #[inline]
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Parse latency percentiles.
    pub fn latency_metrics(&self) -> LatencyMetrics {
        self.latency_histogram.metrics()
    }
}
