use std::time::Duration;

pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:8000";

pub const DEFAULT_RPC_TARGET: &str = "localhost:50051";

/// Port assumed when an RPC target omits one.
pub const DEFAULT_RPC_PORT: u16 = 50051;

pub const DEFAULT_TERM_PREFIX: &str = "LoadTest";

pub const DEFAULT_THINK_MIN: Duration = Duration::from_secs(1);
pub const DEFAULT_THINK_MAX: Duration = Duration::from_secs(3);

/// Per-call timeout applied by the adapters unless configured otherwise.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `stop()` waits for virtual users before abandoning them.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Delay before the single retry of a failed session seed.
pub const SEED_RETRY_DELAY: Duration = Duration::from_secs(1);
