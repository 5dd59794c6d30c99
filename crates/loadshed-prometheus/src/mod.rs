//! Prometheus metrics integration for loadshed.
//!
//! [`PrometheusReporter`] implements [`loadshed::Reporter`] and exports the
//! admission counters, occupancy gauges and a wait-time histogram. The
//! collectors are registered against a caller-supplied registry, so
//! applications and tests control metric visibility explicitly instead of
//! sharing a process-global default.

use loadshed::{Reporter, Stats};
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

/// Reporter exporting admission-control metrics to Prometheus.
#[derive(Debug, Clone)]
pub struct PrometheusReporter {
    // Counter metrics
    requests_accepted: IntCounter,
    requests_rejected: IntCounter,

    // Gauges for current state
    concurrency_running: IntGauge,
    concurrency_waiting: IntGauge,
    concurrency_limit: IntGauge,
    utilization_ratio: Gauge,

    // Wait-time distribution
    wait_time_seconds: Histogram,
}

impl PrometheusReporter {
    /// Create the reporter and register its collectors with `registry`.
    ///
    /// `namespace` prefixes every metric name (e.g. "myapp" →
    /// "myapp_requests_accepted_total").
    pub fn new(namespace: &str, registry: &Registry) -> prometheus::Result<Self> {
        let requests_accepted = IntCounter::with_opts(
            Opts::new(
                "requests_accepted_total",
                "Total number of requests accepted by the load shedder",
            )
            .namespace(namespace),
        )?;
        let requests_rejected = IntCounter::with_opts(
            Opts::new(
                "requests_rejected_total",
                "Total number of requests rejected by the load shedder due to capacity",
            )
            .namespace(namespace),
        )?;
        let concurrency_running = IntGauge::with_opts(
            Opts::new("concurrency_running", "Current number of running requests")
                .namespace(namespace),
        )?;
        let concurrency_waiting = IntGauge::with_opts(
            Opts::new(
                "concurrency_waiting",
                "Current number of requests waiting for a slot",
            )
            .namespace(namespace),
        )?;
        let concurrency_limit = IntGauge::with_opts(
            Opts::new("concurrency_limit", "Configured concurrency limit").namespace(namespace),
        )?;
        let utilization_ratio = Gauge::with_opts(
            Opts::new(
                "utilization_ratio",
                "Current utilization ratio (running / limit)",
            )
            .namespace(namespace),
        )?;
        let wait_time_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "wait_time_seconds",
                "Time requests spent waiting for a slot",
            )
            .namespace(namespace),
        )?;

        registry.register(Box::new(requests_accepted.clone()))?;
        registry.register(Box::new(requests_rejected.clone()))?;
        registry.register(Box::new(concurrency_running.clone()))?;
        registry.register(Box::new(concurrency_waiting.clone()))?;
        registry.register(Box::new(concurrency_limit.clone()))?;
        registry.register(Box::new(utilization_ratio.clone()))?;
        registry.register(Box::new(wait_time_seconds.clone()))?;

        Ok(Self {
            requests_accepted,
            requests_rejected,
            concurrency_running,
            concurrency_waiting,
            concurrency_limit,
            utilization_ratio,
            wait_time_seconds,
        })
    }

    fn update_gauges(&self, stats: &Stats) {
        self.concurrency_running.set(stats.running as i64);
        self.concurrency_waiting.set(stats.waiting as i64);
        self.concurrency_limit.set(stats.limit as i64);
        self.utilization_ratio.set(stats.utilization());
        self.wait_time_seconds.observe(stats.wait_time.as_secs_f64());
    }
}

impl Reporter for PrometheusReporter {
    fn accepted(&self, stats: &Stats) {
        self.requests_accepted.inc();
        self.update_gauges(stats);
    }

    fn rejected(&self, stats: &Stats) {
        self.requests_rejected.inc();
        self.update_gauges(stats);
    }
}
