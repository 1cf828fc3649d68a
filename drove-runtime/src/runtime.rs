//! The command-line load runtime.
//!
//! Resolves the configuration, builds the archetype mix for the chosen protocol, runs the
//! virtual users until the run time elapses or the process is interrupted, and reports as
//! it goes.
use crate::catalog::{select_mix, Catalog, MAX_ACTION_CALLS};
use crate::cli::{DroveCli, ProtocolChoice};
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::events::{write_events, EVENTS_CAPACITY};
use crate::payload::PayloadGenerator;
use crate::report::{Reporter, RunReport};
use clap::Parser;
use drove::adapter::{RestAdapterFactory, RpcAdapterFactory};
use drove::emitter::{BucketSink, ChannelSink, MeasurementSink, MetricsSink, Tee};
use drove::{AdapterFactory, Archetype, LoadTest};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// How long the event log may keep writing after the users stopped.
const EVENTS_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// # Example
///
/// ```ignore
/// use drove_runtime::DroveRuntime;
///
/// #[tokio::main]
/// async fn main() -> Result<(), drove_runtime::RuntimeError> {
///     let report = DroveRuntime::new().with_args()?.run().await?;
///     println!("{report}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DroveRuntime {
    config: RuntimeConfig,
}

impl DroveRuntime {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
        }
    }

    /// Read flags and environment variables. See `drove --help`.
    pub fn with_args(mut self) -> Result<Self, RuntimeError> {
        self.config = RuntimeConfig::try_from(DroveCli::parse())?;
        Ok(self)
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    #[instrument(name = "drove", skip_all, fields(protocol = %self.config.protocol))]
    pub async fn run(self) -> Result<RunReport, RuntimeError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until the configured run time elapses or `interrupt` completes, whichever is
    /// first.
    pub async fn run_until<S>(self, interrupt: S) -> Result<RunReport, RuntimeError>
    where
        S: Future<Output = ()>,
    {
        let config = self.config;
        config.run.validate()?;

        if let Some(addr) = config.prometheus_addr {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
            info!("Serving Prometheus metrics on {addr}");
        }

        let catalog = Catalog::new(
            config.run.think_time,
            PayloadGenerator::new(config.run.term_prefix.clone()),
        )
        .action_limit(config.run.call_timeout * MAX_ACTION_CALLS);

        match config.protocol {
            ProtocolChoice::Rest => {
                let factory =
                    RestAdapterFactory::new(&config.run.rest_base_url, config.run.call_timeout)?;
                info!("Targeting {}", factory.base_url());
                let mix = select_mix(catalog.rest()?, &config.archetypes)?;
                run_load(factory, mix, &config, interrupt).await
            }
            ProtocolChoice::Grpc => {
                let factory =
                    RpcAdapterFactory::new(&config.run.rpc_target, config.run.call_timeout)?;
                info!("Targeting {}", factory.uri());
                let mix = select_mix(catalog.rpc()?, &config.archetypes)?;
                run_load(factory, mix, &config, interrupt).await
            }
        }
    }
}

async fn run_load<F, S>(
    factory: F,
    mix: Vec<(Arc<Archetype<F::Adapter>>, u32)>,
    config: &RuntimeConfig,
    interrupt: S,
) -> Result<RunReport, RuntimeError>
where
    F: AdapterFactory,
    S: Future<Output = ()>,
{
    let bucket = Arc::new(BucketSink::new());
    let mut sink = Tee::new(vec![bucket.clone() as Arc<dyn MeasurementSink>]);
    if config.prometheus_addr.is_some() {
        sink = sink.with(Arc::new(MetricsSink::new()));
    }

    let mut writer: Option<JoinHandle<Result<u64, RuntimeError>>> = None;
    if let Some(path) = &config.events_file {
        let (channel, rx) = ChannelSink::new(EVENTS_CAPACITY);
        sink = sink.with(Arc::new(channel));
        writer = Some(tokio::spawn(write_events(path.clone(), rx)));
    }

    for (archetype, weight) in &mix {
        info!(
            "Archetype {} (weight {weight}, think {}, {} actions)",
            archetype.name(),
            archetype.think_time(),
            archetype.actions().len()
        );
    }

    let mut load = LoadTest::new(factory)
        .population(config.run.population)
        .spawn_rate(config.run.spawn_rate)
        .grace_period(config.run.grace_period)
        .max_rps(config.run.max_rps)
        .sink(Arc::new(sink));
    for (archetype, weight) in mix {
        load = load.archetype(archetype, weight);
    }

    let running = load.start().await?;
    match config.run.run_time {
        Some(run_time) => info!("Running for {}", humantime::format_duration(run_time)),
        None => info!("Running until interrupted"),
    }

    let mut reporter = Reporter::new();
    let mut ticker = interval_at(
        Instant::now() + config.report_interval,
        config.report_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_report = Instant::now();

    let deadline = async {
        match config.run.run_time {
            Some(run_time) => tokio::time::sleep(run_time).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Run time elapsed");
                break;
            }
            _ = &mut interrupt => {
                info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                reporter.record(bucket.drain());
                let interval = reporter.interval(last_report.elapsed());
                last_report = Instant::now();
                info!(
                    "users={}/{} {interval}",
                    running.running(),
                    running.population()
                );
            }
        }
    }

    let stats = running.stop().await;
    reporter.record(bucket.drain());

    if let Some(writer) = writer {
        match tokio::time::timeout(EVENTS_FLUSH_TIMEOUT, writer).await {
            Ok(Ok(Ok(written))) => info!("Wrote {written} events"),
            Ok(Ok(Err(err))) => error!("Event log failed: {err}"),
            Ok(Err(err)) => error!("Event log task failed: {err}"),
            Err(_) => warn!("Event log still open after lingering users; leaving it"),
        }
    }

    Ok(reporter.finish(stats))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
