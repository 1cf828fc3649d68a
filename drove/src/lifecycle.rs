//! Virtual user lifecycle: spawn ramp, session seeding, stop with a grace period.
use crate::adapter::{AdapterFactory, ProtocolAdapter};
use crate::archetype::Archetype;
use crate::emitter::{MeasurementSink, Tee};
use crate::error::LoadError;
use crate::limiter::RateCeiling;
use crate::scheduler::{panic_message, Scheduler, StopHandle, StopSignal};
use crate::select::WeightedTable;
use drove_core::{
    ConfigError, ErrorClass, RunStatistics, SeedError, SessionState, DEFAULT_GRACE_PERIOD,
    SEED_RETRY_DELAY,
};
use futures_util::FutureExt;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroU32;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Configuration of one load run. Consumed by [`LoadTest::start`].
pub struct LoadTest<F: AdapterFactory> {
    factory: Arc<F>,
    mix: Vec<(Arc<Archetype<F::Adapter>>, u32)>,
    population: usize,
    spawn_rate: f64,
    sink: Arc<dyn MeasurementSink>,
    grace_period: Duration,
    max_rps: Option<NonZeroU32>,
    rng_seed: Option<u64>,
}

impl<F: AdapterFactory> LoadTest<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            mix: vec![],
            population: 1,
            spawn_rate: 1.,
            sink: Arc::new(Tee::default()),
            grace_period: DEFAULT_GRACE_PERIOD,
            max_rps: None,
            rng_seed: None,
        }
    }

    /// Add an archetype to the mix. Users are assigned archetypes in proportion to weight.
    pub fn archetype(mut self, archetype: Arc<Archetype<F::Adapter>>, weight: u32) -> Self {
        self.mix.push((archetype, weight));
        self
    }

    pub fn population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    /// Users started per second during the ramp.
    pub fn spawn_rate(mut self, spawn_rate: f64) -> Self {
        self.spawn_rate = spawn_rate;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn MeasurementSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn max_rps(mut self, max_rps: Option<NonZeroU32>) -> Self {
        self.max_rps = max_rps;
        self
    }

    /// Make archetype assignment and every user's draws reproducible.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Validate, probe the target once, then ramp users up in the background.
    ///
    /// Returns as soon as the ramp is scheduled. User `k` is spawned `k / spawn_rate`
    /// seconds after this returns.
    #[instrument(name = "load", skip_all, fields(population = self.population))]
    pub async fn start(self) -> Result<RunningLoad, LoadError> {
        if self.mix.is_empty() {
            return Err(LoadError::EmptyMix);
        }
        if !(self.spawn_rate.is_finite() && self.spawn_rate > 0.) {
            return Err(ConfigError::InvalidSpawnRate(self.spawn_rate).into());
        }
        let names: Vec<_> = self
            .mix
            .iter()
            .map(|(archetype, weight)| format!("{}:{weight}", archetype.name()))
            .collect();
        let mix = WeightedTable::new(self.mix, |archetype| archetype.name().to_string())?;

        let probe = self.factory.connect().await?;
        drop(probe);

        info!(
            "Starting {} users at {}/s with archetypes [{}]",
            self.population,
            self.spawn_rate,
            names.join(", ")
        );

        let stop = StopHandle::new();
        let counters = Arc::new(UserCounters::default());
        let ceiling = RateCeiling::new(self.max_rps);
        let period = spawn_period(self.spawn_rate);
        let first_spawn = Instant::now() + period;

        let ramp = Ramp {
            factory: self.factory,
            mix,
            population: self.population,
            sink: self.sink,
            ceiling: ceiling.clone(),
            counters: counters.clone(),
            stop: stop.signal(),
            rng: match self.rng_seed {
                Some(seed) => SmallRng::seed_from_u64(seed),
                None => SmallRng::from_entropy(),
            },
        };
        let ramp = tokio::spawn(ramp.run(first_spawn, period).in_current_span());

        Ok(RunningLoad {
            stop,
            ramp: Some(ramp),
            counters,
            ceiling,
            population: self.population,
            grace_period: self.grace_period,
            started: Instant::now(),
        })
    }
}

/// Slowest ramp pace; slower rates still start a user once a year.
const MAX_SPAWN_PERIOD: Duration = Duration::from_secs(86_400 * 365);

fn spawn_period(spawn_rate: f64) -> Duration {
    Duration::try_from_secs_f64(spawn_rate.recip())
        .unwrap_or(MAX_SPAWN_PERIOD)
        .clamp(Duration::from_nanos(1), MAX_SPAWN_PERIOD)
}

/// Handle to a load run in progress.
pub struct RunningLoad {
    stop: StopHandle,
    ramp: Option<JoinHandle<Vec<JoinHandle<u64>>>>,
    counters: Arc<UserCounters>,
    ceiling: RateCeiling,
    population: usize,
    grace_period: Duration,
    started: Instant,
}

impl RunningLoad {
    /// Users past their session seed and inside their action loop.
    pub fn running(&self) -> usize {
        self.counters.running.load(Ordering::Relaxed)
    }

    pub fn spawned(&self) -> usize {
        self.counters.spawned.load(Ordering::Relaxed)
    }

    pub fn connect_failures(&self) -> usize {
        self.counters.connect_failures.load(Ordering::Relaxed)
    }

    pub fn population(&self) -> usize {
        self.population
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Move the global rate ceiling. `None` removes it.
    pub fn set_max_rps(&self, max_rps: Option<NonZeroU32>) {
        info!("Setting rate ceiling to {max_rps:?}");
        self.ceiling.set(max_rps);
    }

    pub async fn run_for(self, duration: Duration) -> RunStatistics {
        tokio::time::sleep(duration).await;
        self.stop().await
    }

    /// Signal every user to stop and wait for them until the grace period runs out.
    ///
    /// Users still running afterwards are left to finish on their own and counted as
    /// lingering.
    #[instrument(name = "stop", skip_all)]
    pub async fn stop(mut self) -> RunStatistics {
        self.stop.stop();
        let deadline = Instant::now() + self.grace_period;
        info!(
            "Stopping {} users, waiting up to {}",
            self.running(),
            humantime::format_duration(self.grace_period)
        );

        let users = match self.ramp.take() {
            Some(ramp) => match ramp.await {
                Ok(users) => users,
                Err(err) => {
                    error!("Spawn ramp failed: {err}");
                    vec![]
                }
            },
            None => vec![],
        };

        let mut actions = 0;
        let mut lingering = 0;
        for user in users {
            match tokio::time::timeout_at(deadline, user).await {
                Ok(Ok(executed)) => actions += executed,
                Ok(Err(err)) => error!("User task failed: {err}"),
                // NOTE: Dropping the handle detaches the task; it is not aborted.
                Err(_) => lingering += 1,
            }
        }

        if lingering > 0 {
            warn!(
                "{lingering} users did not stop within {}; abandoning them",
                humantime::format_duration(self.grace_period)
            );
        }

        let stats = RunStatistics {
            population: self.population,
            spawned: self.spawned(),
            failed_to_connect: self.connect_failures(),
            lingering,
            actions,
            elapsed: self.started.elapsed(),
        };
        info!("Load stopped: {stats}");
        stats
    }
}

#[derive(Debug, Default)]
struct UserCounters {
    running: AtomicUsize,
    spawned: AtomicUsize,
    connect_failures: AtomicUsize,
}

impl UserCounters {
    fn enter(&self) -> RunningGuard<'_> {
        self.running.fetch_add(1, Ordering::Relaxed);
        RunningGuard(&self.running)
    }
}

struct RunningGuard<'a>(&'a AtomicUsize);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

struct Ramp<F: AdapterFactory> {
    factory: Arc<F>,
    mix: WeightedTable<Arc<Archetype<F::Adapter>>>,
    population: usize,
    sink: Arc<dyn MeasurementSink>,
    ceiling: RateCeiling,
    counters: Arc<UserCounters>,
    stop: StopSignal,
    rng: SmallRng,
}

impl<F: AdapterFactory> Ramp<F> {
    async fn run(mut self, first_spawn: Instant, period: Duration) -> Vec<JoinHandle<u64>> {
        let mut ticks = interval_at(first_spawn, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut users = Vec::with_capacity(self.population);
        for id in 0..self.population {
            tokio::select! {
                _ = ticks.tick() => {},
                _ = self.stop.wait() => {
                    debug!("Ramp stopped after {id} users");
                    return users;
                }
            }

            let archetype = self.mix.pick(&mut self.rng).clone();
            let user = User {
                id,
                factory: self.factory.clone(),
                archetype,
                sink: self.sink.clone(),
                ceiling: self.ceiling.clone(),
                counters: self.counters.clone(),
                stop: self.stop.clone(),
                rng: SmallRng::seed_from_u64(self.rng.gen()),
            };
            users.push(tokio::spawn(user.run()));
            self.counters.spawned.fetch_add(1, Ordering::Relaxed);
        }

        info!("All {} users spawned", self.population);
        users
    }
}

struct User<F: AdapterFactory> {
    id: usize,
    factory: Arc<F>,
    archetype: Arc<Archetype<F::Adapter>>,
    sink: Arc<dyn MeasurementSink>,
    ceiling: RateCeiling,
    counters: Arc<UserCounters>,
    stop: StopSignal,
    rng: SmallRng,
}

impl<F: AdapterFactory> User<F> {
    #[instrument(name = "user", skip_all, fields(id = self.id, archetype = self.archetype.name()))]
    async fn run(mut self) -> u64 {
        let adapter = match self.factory.connect().await {
            Ok(adapter) => adapter,
            Err(err) => {
                error!("Failed to connect: {err}");
                self.counters
                    .connect_failures
                    .fetch_add(1, Ordering::Relaxed);
                return 0;
            }
        };

        let Some(mut session) = seed_session(&self.archetype, &adapter, &mut self.stop).await
        else {
            return 0;
        };

        let _running = self.counters.enter();
        debug!("Running with {} known ids", session.len());

        Scheduler::new(self.archetype.clone(), self.sink.clone())
            .with_ceiling(self.ceiling.clone())
            .run(&adapter, &mut session, &mut self.rng, self.stop.clone())
            .await
    }
}

/// Seed a session, retrying once. `None` if the run stopped while waiting to retry.
async fn seed_session<A: ProtocolAdapter>(
    archetype: &Archetype<A>,
    adapter: &A,
    stop: &mut StopSignal,
) -> Option<SessionState> {
    if !archetype.has_on_start() {
        return Some(SessionState::new());
    }

    match attempt_seed(archetype, adapter).await {
        Ok(session) => return Some(session),
        Err(err) => warn!(
            "{err}; retrying in {}",
            humantime::format_duration(SEED_RETRY_DELAY)
        ),
    }

    tokio::select! {
        _ = tokio::time::sleep(SEED_RETRY_DELAY) => {},
        _ = stop.wait() => return None,
    }

    match attempt_seed(archetype, adapter).await {
        Ok(session) => Some(session),
        Err(err) => {
            warn!("{err}; continuing with an empty session");
            Some(SessionState::new())
        }
    }
}

async fn attempt_seed<A: ProtocolAdapter>(
    archetype: &Archetype<A>,
    adapter: &A,
) -> Result<SessionState, SeedError> {
    match AssertUnwindSafe(archetype.seed(adapter)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(SeedError::new(
            ErrorClass::Unknown,
            panic_message(panic.as_ref()),
        )),
    }
}
