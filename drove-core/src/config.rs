use crate::constants::*;
use crate::error::ConfigError;
use crate::random::RandomSource;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// Uniform pause between a virtual user's consecutive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkTime {
    min: Duration,
    max: Duration,
}

impl ThinkTime {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidThinkTime { min, max });
        }
        Ok(Self { min, max })
    }

    /// Bounds given in (possibly fractional) seconds, as the environment supplies them.
    pub fn from_secs_f64(min: f64, max: f64) -> Result<Self, ConfigError> {
        Self::new(secs(min)?, secs(max)?)
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Uniform sample in `[min, max]`, inclusive on both ends, at nanosecond resolution.
    pub fn sample<R>(&self, rng: &mut R) -> Duration
    where
        R: RandomSource + ?Sized,
    {
        let span = u64::try_from((self.max - self.min).as_nanos()).unwrap_or(u64::MAX);
        self.min + Duration::from_nanos(rng.draw(span.saturating_add(1)))
    }
}

impl Default for ThinkTime {
    fn default() -> Self {
        Self {
            min: DEFAULT_THINK_MIN,
            max: DEFAULT_THINK_MAX,
        }
    }
}

impl fmt::Display for ThinkTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            humantime::format_duration(self.min),
            humantime::format_duration(self.max)
        )
    }
}

fn secs(value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidSeconds(value))
}

/// Process-wide run configuration. Read once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub rest_base_url: String,
    pub rpc_target: String,
    pub think_time: ThinkTime,
    pub term_prefix: String,
    pub population: usize,
    pub spawn_rate: f64,
    pub run_time: Option<Duration>,
    pub call_timeout: Duration,
    pub grace_period: Duration,
    pub max_rps: Option<NonZeroU32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            rpc_target: DEFAULT_RPC_TARGET.to_string(),
            think_time: ThinkTime::default(),
            term_prefix: DEFAULT_TERM_PREFIX.to_string(),
            population: 50,
            spawn_rate: 5.,
            run_time: Some(Duration::from_secs(180)),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            max_rps: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spawn_rate.is_finite() && self.spawn_rate > 0.) {
            return Err(ConfigError::InvalidSpawnRate(self.spawn_rate));
        }
        if self.rest_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.rest_base_url.clone(),
                reason: "empty REST base URL".to_string(),
            });
        }
        self.rpc_endpoint().map(|_| ())
    }

    /// The RPC target as a URI, with the default port filled in when omitted.
    pub fn rpc_endpoint(&self) -> Result<String, ConfigError> {
        rpc_endpoint(&self.rpc_target)
    }
}

/// Normalize `host[:port]` (optionally with a scheme) into `scheme://host:port`.
pub fn rpc_endpoint(target: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        endpoint: target.to_string(),
        reason: reason.to_string(),
    };

    let (scheme, rest) = match target.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", target),
    };
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Err(invalid("missing host"));
    }

    match rest.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                return Err(invalid("missing host"));
            }
            port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
            Ok(format!("{scheme}://{host}:{port}"))
        }
        None => Ok(format!("{scheme}://{rest}:{DEFAULT_RPC_PORT}")),
    }
}
