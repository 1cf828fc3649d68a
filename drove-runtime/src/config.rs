use crate::catalog::ArchetypeChoice;
use crate::cli::{DroveCli, ProtocolChoice};
use drove_core::{ConfigError, RunConfig, ThinkTime};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Everything the runtime needs, resolved once from the command line and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub run: RunConfig,
    pub protocol: ProtocolChoice,
    pub archetypes: Vec<ArchetypeChoice>,
    pub report_interval: Duration,
    pub prometheus_addr: Option<SocketAddr>,
    pub events_file: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            protocol: ProtocolChoice::Rest,
            archetypes: vec![],
            report_interval: DEFAULT_REPORT_INTERVAL,
            prometheus_addr: None,
            events_file: None,
        }
    }
}

impl TryFrom<DroveCli> for RuntimeConfig {
    type Error = ConfigError;

    fn try_from(cli: DroveCli) -> Result<Self, Self::Error> {
        let run = RunConfig {
            rest_base_url: cli.rest_base_url,
            rpc_target: cli.grpc_target,
            think_time: ThinkTime::from_secs_f64(cli.wait_time_min, cli.wait_time_max)?,
            term_prefix: cli.term_prefix,
            population: cli.users,
            spawn_rate: cli.spawn_rate,
            run_time: (!cli.run_time.is_zero()).then_some(cli.run_time),
            call_timeout: cli.call_timeout,
            grace_period: cli.grace_period,
            max_rps: cli.max_rps,
        };
        run.validate()?;

        Ok(Self {
            run,
            protocol: cli.protocol,
            archetypes: cli.archetypes,
            // NOTE: A zero interval would make the report ticker panic.
            report_interval: if cli.report_interval.is_zero() {
                DEFAULT_REPORT_INTERVAL
            } else {
                cli.report_interval
            },
            prometheus_addr: cli.prometheus_addr,
            events_file: cli.events_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<RuntimeConfig, ConfigError> {
        let mut argv = vec!["drove"];
        argv.extend_from_slice(args);
        RuntimeConfig::try_from(DroveCli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn cli_resolves_into_run_config() {
        let config = parse(&[
            "--wait-time-min",
            "0.5",
            "--wait-time-max",
            "2",
            "--run-time",
            "0s",
            "--users",
            "7",
        ])
        .unwrap();

        assert_eq!(config.run.think_time.min(), Duration::from_millis(500));
        assert_eq!(config.run.think_time.max(), Duration::from_secs(2));
        assert_eq!(config.run.population, 7);
        assert_eq!(config.run.run_time, None);
        assert_eq!(config.protocol, ProtocolChoice::Rest);
    }

    #[test]
    fn invalid_settings_fail_before_the_run() {
        assert!(matches!(
            parse(&["--wait-time-min", "5", "--wait-time-max", "1"]),
            Err(ConfigError::InvalidThinkTime { .. })
        ));
        assert!(matches!(
            parse(&["--spawn-rate", "0"]),
            Err(ConfigError::InvalidSpawnRate(_))
        ));
        assert!(matches!(
            parse(&["--grpc-target", "glossary:notaport"]),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }
}
