//! The per-user action loop.
use crate::adapter::ProtocolAdapter;
use crate::archetype::{ActionContext, Archetype};
use crate::emitter::MeasurementSink;
use crate::limiter::RateCeiling;
use crate::timed::Timed;
use drove_core::{ErrorClass, MeasurementEvent, Outcome, RandomSource, SessionState};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Receiving side of a run-wide stop flag. Once set it stays set.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Also true once the owning [`StopHandle`] is gone.
    pub fn is_set(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    pub async fn wait(&mut self) {
        // NOTE: An error means the handle was dropped, which counts as a stop.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one archetype's weighted action loop for one virtual user.
pub struct Scheduler<A> {
    archetype: Arc<Archetype<A>>,
    sink: Arc<dyn MeasurementSink>,
    ceiling: RateCeiling,
}

impl<A: ProtocolAdapter> Scheduler<A> {
    pub fn new(archetype: Arc<Archetype<A>>, sink: Arc<dyn MeasurementSink>) -> Self {
        Self {
            archetype,
            sink,
            ceiling: RateCeiling::default(),
        }
    }

    pub fn with_ceiling(mut self, ceiling: RateCeiling) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn archetype(&self) -> &Archetype<A> {
        &self.archetype
    }

    /// Loop until `stop` is set, returning the number of actions executed.
    ///
    /// An action already in flight when the stop arrives completes and is reported; no
    /// action starts afterwards.
    pub async fn run<R>(
        &self,
        adapter: &A,
        session: &mut SessionState,
        rng: &mut R,
        mut stop: StopSignal,
    ) -> u64
    where
        R: RandomSource + Send,
    {
        let protocol = adapter.protocol();
        let think_time = self.archetype.think_time();
        let mut executed = 0u64;

        loop {
            if stop.is_set() {
                break;
            }

            if self.ceiling.is_limited() {
                tokio::select! {
                    _ = self.ceiling.until_ready() => {},
                    _ = stop.wait() => break,
                }
            }

            let action = self.archetype.select(rng);
            trace!("Executing {}", action.name());

            let ctx = ActionContext {
                adapter,
                session: &mut *session,
                rng: &mut *rng,
            };
            let (result, latency) =
                Timed::new(AssertUnwindSafe(action.execute(ctx)).catch_unwind()).await;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("Action {} panicked: {message}", action.name());
                    Outcome::failure(ErrorClass::Unknown, message)
                }
            }
            .with_latency(latency);

            self.sink.emit(MeasurementEvent::from_outcome(
                protocol,
                action.name(),
                &outcome,
            ));
            executed += 1;

            let pause = think_time.sample(rng);
            trace!("Thinking for {}", humantime::format_duration(pause));
            tokio::select! {
                _ = tokio::time::sleep(pause) => {},
                _ = stop.wait() => break,
            }
        }

        debug!("Scheduler stopped after {executed} actions");
        executed
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("action panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("action panicked: {msg}")
    } else {
        "action panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::BucketSink;
    use crate::testing::StubAdapter;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::time::Duration;
    use tokio::time::Instant;

    fn think(millis: u64) -> (Duration, Duration) {
        (Duration::from_millis(millis), Duration::from_millis(millis))
    }

    async fn run_until(
        archetype: Archetype<StubAdapter>,
        stop_after: Duration,
    ) -> (u64, Vec<MeasurementEvent>) {
        let sink = Arc::new(BucketSink::new());
        let scheduler = Scheduler::new(Arc::new(archetype), sink.clone());
        let adapter = StubAdapter::default();
        let mut session = SessionState::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let handle = StopHandle::new();

        let (executed, _) = tokio::join!(
            scheduler.run(&adapter, &mut session, &mut rng, handle.signal()),
            async {
                tokio::time::sleep(stop_after).await;
                handle.stop();
            }
        );
        (executed, sink.drain())
    }

    async fn explode(_ctx: ActionContext<'_, StubAdapter>) -> Outcome {
        panic!("kaboom")
    }

    #[tracing_test::traced_test]
    #[tokio::test(start_paused = true)]
    async fn panics_become_unknown_failures() {
        let (min, max) = think(10);
        let archetype = Archetype::builder("flaky")
            .think_time(min, max)
            .action("boom", 1, |ctx| Box::pin(explode(ctx)))
            .action("fine", 1, |ctx| {
                Box::pin(async move { ctx.adapter.call(drove_core::Operation::ListTerms).await })
            })
            .build()
            .unwrap();

        let (executed, events) = run_until(archetype, Duration::from_secs(1)).await;
        assert_eq!(executed as usize, events.len());

        let panicked: Vec<_> = events.iter().filter(|e| e.operation == "boom").collect();
        assert!(!panicked.is_empty());
        for event in panicked {
            assert!(event.failed);
            let detail = event.error_detail.as_deref().unwrap();
            assert!(detail.starts_with("Unknown"), "{detail}");
            assert!(detail.contains("kaboom"), "{detail}");
        }
        assert!(events.iter().any(|e| e.operation == "fine" && !e.failed));
        assert!(logs_contain("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_action_finishes_then_loop_exits() {
        let (min, max) = think(50);
        let archetype = Archetype::builder("slow")
            .think_time(min, max)
            .action("sleepy", 1, |_ctx| {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Outcome::success(1)
                })
            })
            .build()
            .unwrap();

        let start = Instant::now();
        // actions run over [0, 100) and [150, 250); the stop lands mid-flight at 200
        let (executed, events) = run_until(archetype, Duration::from_millis(200)).await;
        assert_eq!(executed, 2);
        assert_eq!(events.len(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(250));
        assert!(events.iter().all(|e| e.latency_millis == 100));
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_reported_as_failed_events() {
        let (min, max) = think(1_000);
        let archetype = Archetype::builder("timeouts")
            .think_time(min, max)
            .action("GetTerm", 1, |_ctx| {
                Box::pin(async {
                    Outcome::failure(ErrorClass::Timeout, "request timed out")
                })
            })
            .build()
            .unwrap();

        let (executed, events) = run_until(archetype, Duration::from_millis(500)).await;
        assert_eq!(executed, 1);
        assert!(events[0].failed);
        assert_eq!(
            events[0].error_detail.as_deref(),
            Some("Timeout: request timed out")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_before_start_runs_nothing() {
        let archetype = Archetype::builder("idle")
            .action("noop", 1, |_ctx| Box::pin(async { Outcome::success(0) }))
            .build()
            .unwrap();
        let sink = Arc::new(BucketSink::new());
        let scheduler = Scheduler::new(Arc::new(archetype), sink.clone());
        let handle = StopHandle::new();
        handle.stop();

        let executed = scheduler
            .run(
                &StubAdapter::default(),
                &mut SessionState::new(),
                &mut SmallRng::seed_from_u64(0),
                handle.signal(),
            )
            .await;
        assert_eq!(executed, 0);
        assert!(sink.drain().is_empty());
    }

    #[tokio::test]
    async fn dropped_handle_counts_as_stop() {
        let handle = StopHandle::new();
        let mut signal = handle.signal();
        assert!(!signal.is_set());
        drop(handle);
        assert!(signal.is_set());
        signal.wait().await;
    }
}
