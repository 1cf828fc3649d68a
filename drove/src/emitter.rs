//! Measurement sinks. Emission is fire-and-forget: a sink never blocks the caller and
//! never reports a failure back to it.
use drove_core::MeasurementEvent;
use metrics_util::AtomicBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

pub trait MeasurementSink: Send + Sync + 'static {
    fn emit(&self, event: MeasurementEvent);
}

/// Lock-free accumulation, drained periodically by a reporter.
pub struct BucketSink {
    bucket: AtomicBucket<MeasurementEvent>,
}

impl BucketSink {
    pub fn new() -> Self {
        Self {
            bucket: AtomicBucket::new(),
        }
    }

    /// Take every event emitted since the last drain.
    pub fn drain(&self) -> Vec<MeasurementEvent> {
        let mut events = vec![];
        self.bucket
            .clear_with(|block| events.extend_from_slice(block));
        events
    }
}

impl Default for BucketSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSink for BucketSink {
    fn emit(&self, event: MeasurementEvent) {
        self.bucket.push(event);
    }
}

/// Forwards events over a bounded channel. A full or closed channel drops the event.
pub struct ChannelSink {
    tx: mpsc::Sender<MeasurementEvent>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<MeasurementEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl MeasurementSink for ChannelSink {
    fn emit(&self, event: MeasurementEvent) {
        if self.tx.try_send(event).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed);
            if dropped == 0 {
                warn!("Measurement channel is full or closed; dropping events.");
            }
        }
    }
}

/// Records latency and success/failure counts through the `metrics` facade.
#[cfg(feature = "metrics")]
#[derive(Debug)]
pub struct MetricsSink {
    _private: (),
}

#[cfg(feature = "metrics")]
impl MetricsSink {
    pub const LATENCY: &'static str = "drove_action_latency";
    pub const SUCCESS: &'static str = "drove_action_success";
    pub const FAILURE: &'static str = "drove_action_failure";

    pub fn new() -> Self {
        metrics::describe_histogram!(
            Self::LATENCY,
            metrics::Unit::Milliseconds,
            "Latency of one action execution"
        );
        metrics::describe_counter!(Self::SUCCESS, "Successful action executions");
        metrics::describe_counter!(Self::FAILURE, "Failed action executions");
        Self { _private: () }
    }
}

#[cfg(feature = "metrics")]
impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
impl MeasurementSink for MetricsSink {
    fn emit(&self, event: MeasurementEvent) {
        let labels = vec![
            metrics::Label::new("protocol", event.protocol.to_string()),
            metrics::Label::new("operation", event.operation),
        ];

        metrics::histogram!(Self::LATENCY, labels.clone()).record(event.latency_millis as f64);
        if event.failed {
            metrics::counter!(Self::FAILURE, labels).increment(1);
        } else {
            metrics::counter!(Self::SUCCESS, labels).increment(1);
        }
    }
}

/// Fans every event out to several sinks.
#[derive(Default, Clone)]
pub struct Tee {
    sinks: Vec<Arc<dyn MeasurementSink>>,
}

impl Tee {
    pub fn new(sinks: Vec<Arc<dyn MeasurementSink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn MeasurementSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MeasurementSink for Tee {
    fn emit(&self, event: MeasurementEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }
}
