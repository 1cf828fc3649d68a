use crate::catalog::ArchetypeChoice;
use clap::{Parser, ValueEnum};
use drove_core::{DEFAULT_REST_BASE_URL, DEFAULT_RPC_TARGET, DEFAULT_TERM_PREFIX};
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolChoice {
    Rest,
    Grpc,
}

impl fmt::Display for ProtocolChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolChoice::Rest => f.write_str("rest"),
            ProtocolChoice::Grpc => f.write_str("grpc"),
        }
    }
}

/// Load test the glossary service with a population of virtual users.
#[derive(Parser, Debug, Clone)]
#[command(name = "drove", version, about)]
pub struct DroveCli {
    /// Which surface of the service to drive.
    #[arg(short, long, value_enum, default_value_t = ProtocolChoice::Rest)]
    pub protocol: ProtocolChoice,

    #[arg(long, env = "REST_BASE_URL", default_value = DEFAULT_REST_BASE_URL)]
    pub rest_base_url: String,

    /// `host[:port]` of the gRPC service. The port defaults to 50051.
    #[arg(long, env = "GRPC_TARGET", default_value = DEFAULT_RPC_TARGET)]
    pub grpc_target: String,

    /// Lower think-time bound in seconds, for the default archetypes.
    #[arg(long, env = "WAIT_TIME_MIN", default_value_t = 1.)]
    pub wait_time_min: f64,

    #[arg(long, env = "WAIT_TIME_MAX", default_value_t = 3.)]
    pub wait_time_max: f64,

    /// Prefix of generated term names and search queries.
    #[arg(long, env = "TERM_PREFIX", default_value = DEFAULT_TERM_PREFIX)]
    pub term_prefix: String,

    #[arg(short, long, default_value_t = 50)]
    pub users: usize,

    /// Users started per second while ramping up.
    #[arg(short = 'r', long, default_value_t = 5.)]
    pub spawn_rate: f64,

    /// How long to run, e.g. `90s` or `3m`. `0s` runs until interrupted.
    #[arg(short = 't', long, value_parser = humantime::parse_duration, default_value = "3m")]
    pub run_time: Duration,

    /// `name[:weight]`; repeat to mix archetypes. Defaults to all of them, equally weighted.
    #[arg(short, long = "archetype")]
    pub archetypes: Vec<ArchetypeChoice>,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub call_timeout: Duration,

    /// How long stopping users may take before they are abandoned.
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
    pub grace_period: Duration,

    /// Ceiling on actions per second across all users.
    #[arg(long)]
    pub max_rps: Option<NonZeroU32>,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    pub report_interval: Duration,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub prometheus_addr: Option<SocketAddr>,

    /// Write every measurement event to this file as JSON lines.
    #[arg(long)]
    pub events_file: Option<PathBuf>,
}
