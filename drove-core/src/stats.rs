use std::fmt;
use std::time::Duration;

/// Summary of one load run, returned when the virtual users are stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Requested number of virtual users.
    pub population: usize,
    /// Users whose task was started.
    pub spawned: usize,
    /// Users that never ran because their adapter could not connect.
    pub failed_to_connect: usize,
    /// Users still running when the grace period ended.
    pub lingering: usize,
    /// Actions executed by users that exited within the grace period.
    pub actions: u64,
    pub elapsed: Duration,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users={}/{} actions={} connect_failures={} lingering={} elapsed={}",
            self.spawned,
            self.population,
            self.actions,
            self.failed_to_connect,
            self.lingering,
            humantime::format_duration(self.elapsed),
        )
    }
}
