//! Folding measurement events into per-operation statistics.
use drove_core::{MeasurementEvent, Protocol, RunStatistics};
use pdatastructs::tdigest::{TDigest, K1};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Failure details kept per operation in the final table.
const MAX_FAILURE_DETAILS: usize = 5;

#[derive(Debug, Clone)]
struct OperationStats {
    count: u64,
    failures: u64,
    total_latency_millis: u64,
    max_latency_millis: u64,
    result_size: u64,
    latency: TDigest<K1>,
    failure_details: BTreeMap<String, u64>,
}

impl OperationStats {
    fn new() -> Self {
        Self {
            count: 0,
            failures: 0,
            total_latency_millis: 0,
            max_latency_millis: 0,
            result_size: 0,
            latency: default_tdigest(),
            failure_details: BTreeMap::new(),
        }
    }

    fn record(&mut self, event: MeasurementEvent) {
        self.count += 1;
        self.total_latency_millis = self.total_latency_millis.saturating_add(event.latency_millis);
        self.max_latency_millis = self.max_latency_millis.max(event.latency_millis);
        self.result_size = self.result_size.saturating_add(event.result_size);
        self.latency.insert(event.latency_millis as f64);

        if event.failed {
            self.failures += 1;
            let detail = event.error_detail.unwrap_or_else(|| "unknown".to_string());
            *self.failure_details.entry(detail).or_default() += 1;
        }
    }

    fn quantile(&self, q: f64) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let millis = self.latency.quantile(q);

        // NOTE: TDigest occasionally returns NaN, which we need to filter for.
        let millis = if millis.is_finite() {
            millis.max(0.)
        } else {
            error!("NaN latency quantile for q={q}");
            0.
        };
        Duration::from_secs_f64(millis / 1_000.)
    }

    fn summarize(&self, protocol: Protocol, operation: &str) -> OperationSummary {
        let mut failure_details: Vec<(String, u64)> = self
            .failure_details
            .iter()
            .map(|(detail, count)| (detail.clone(), *count))
            .collect();
        failure_details.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        OperationSummary {
            protocol,
            operation: operation.to_string(),
            count: self.count,
            failures: self.failures,
            mean_latency: Duration::from_millis(self.total_latency_millis / self.count.max(1)),
            max_latency: Duration::from_millis(self.max_latency_millis),
            p50: self.quantile(0.5),
            p90: self.quantile(0.9),
            p99: self.quantile(0.99),
            result_size: self.result_size,
            failure_details,
        }
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

/// Statistics of one `(protocol, operation)` pair over the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSummary {
    pub protocol: Protocol,
    pub operation: String,
    pub count: u64,
    pub failures: u64,
    pub mean_latency: Duration,
    pub max_latency: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub result_size: u64,
    /// Most frequent first.
    pub failure_details: Vec<(String, u64)>,
}

impl OperationSummary {
    pub fn failure_rate(&self) -> f64 {
        if self.count == 0 {
            0.
        } else {
            self.failures as f64 / self.count as f64
        }
    }
}

/// Counts since the previous interval report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntervalSummary {
    pub actions: u64,
    pub failures: u64,
    pub mean_latency: Duration,
    pub elapsed: Duration,
}

impl IntervalSummary {
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            self.actions as f64 / secs
        } else {
            0.
        }
    }
}

impl fmt::Display for IntervalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "actions={} rps={:.1} failures={} mean={}ms",
            self.actions,
            self.rate(),
            self.failures,
            self.mean_latency.as_millis(),
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct IntervalCounts {
    actions: u64,
    failures: u64,
    latency_millis: u64,
}

/// Accumulates events drained from a sink.
#[derive(Debug, Clone)]
pub struct Reporter {
    operations: BTreeMap<(Protocol, String), OperationStats>,
    interval: IntervalCounts,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            operations: BTreeMap::new(),
            interval: IntervalCounts::default(),
        }
    }

    pub fn record<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = MeasurementEvent>,
    {
        for event in events {
            self.interval.actions += 1;
            self.interval.latency_millis =
                self.interval.latency_millis.saturating_add(event.latency_millis);
            if event.failed {
                self.interval.failures += 1;
            }

            let key = (event.protocol, event.operation.clone());
            self.operations
                .entry(key)
                .or_insert_with(OperationStats::new)
                .record(event);
        }
    }

    /// Take the counts gathered since the previous call.
    pub fn interval(&mut self, elapsed: Duration) -> IntervalSummary {
        let counts = std::mem::take(&mut self.interval);
        IntervalSummary {
            actions: counts.actions,
            failures: counts.failures,
            mean_latency: Duration::from_millis(counts.latency_millis / counts.actions.max(1)),
            elapsed,
        }
    }

    pub fn total_actions(&self) -> u64 {
        self.operations.values().map(|stats| stats.count).sum()
    }

    pub fn summaries(&self) -> Vec<OperationSummary> {
        self.operations
            .iter()
            .map(|((protocol, operation), stats)| stats.summarize(*protocol, operation))
            .collect()
    }

    pub fn finish(self, stats: RunStatistics) -> RunReport {
        RunReport {
            operations: self.summaries(),
            stats,
        }
    }
}

/// The final result of a run: lifecycle statistics plus the per-operation table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub stats: RunStatistics,
    pub operations: Vec<OperationSummary>,
}

impl RunReport {
    pub fn total_failures(&self) -> u64 {
        self.operations.iter().map(|op| op.failures).sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .operations
            .iter()
            .map(|op| op.operation.len())
            .max()
            .unwrap_or(0)
            .max("Operation".len());

        writeln!(
            f,
            "{:<5} {:<width$} {:>8} {:>8} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
            "Proto",
            "Operation",
            "Count",
            "Failed",
            "Fail%",
            "Mean",
            "p50",
            "p90",
            "p99",
            "Max",
            "Results",
        )?;
        for op in &self.operations {
            writeln!(
                f,
                "{:<5} {:<width$} {:>8} {:>8} {:>6.2}% {:>6}ms {:>6}ms {:>6}ms {:>6}ms {:>6}ms {:>10}",
                op.protocol.to_string(),
                op.operation,
                op.count,
                op.failures,
                op.failure_rate() * 100.,
                op.mean_latency.as_millis(),
                op.p50.as_millis(),
                op.p90.as_millis(),
                op.p99.as_millis(),
                op.max_latency.as_millis(),
                op.result_size,
            )?;
        }

        let failing: Vec<_> = self
            .operations
            .iter()
            .filter(|op| !op.failure_details.is_empty())
            .collect();
        if !failing.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures:")?;
            for op in failing {
                for (detail, count) in op.failure_details.iter().take(MAX_FAILURE_DETAILS) {
                    writeln!(f, "  {:>6}  {} {}: {detail}", count, op.protocol, op.operation)?;
                }
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.stats)
    }
}
