use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Events the service counts. Each variant owns one slot in `AppMetrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Request,
    Translation,
    Lookup,
    /// A provider was consulted but the reply fell back to canned wording.
    Fallback,
    Throttled,
    Error,
}

impl Counter {
    const COUNT: usize = 6;

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    counters: [AtomicU64; Counter::COUNT],
    latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub translations_total: u64,
    pub lookups_total: u64,
    pub fallback_total: u64,
    pub throttled_total: u64,
    pub errors_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, counter: Counter) {
        self.counters[counter.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, counter: Counter) -> u64 {
        self.counters[counter.slot()].load(Ordering::Relaxed)
    }

    pub fn observe_latency(&self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.latency_millis.fetch_add(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests_total = self.count(Counter::Request);
        let avg_latency_millis = match requests_total {
            0 => 0.0,
            n => self.latency_millis.load(Ordering::Relaxed) as f64 / n as f64,
        };

        MetricsSnapshot {
            requests_total,
            translations_total: self.count(Counter::Translation),
            lookups_total: self.count(Counter::Lookup),
            fallback_total: self.count(Counter::Fallback),
            throttled_total: self.count(Counter::Throttled),
            errors_total: self.count(Counter::Error),
            avg_latency_millis,
        }
    }
}

fn default_directives(binary: &str) -> String {
    [binary, "shadow_api", "shadow_agents", "shadow_lookup"]
        .iter()
        .map(|target| format!("{target}=info"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the JSON subscriber once per process. `RUST_LOG` wins over the
/// built-in directives when it is set.
pub fn init_tracing(binary: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(binary)));
        let json = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true);

        // a subscriber installed by a test harness is left alone
        let _ = tracing_subscriber::registry().with(filter).with(json).try_init();
    });
}
