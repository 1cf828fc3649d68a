use drove::{AdapterError, ArchetypeError, LoadError};
use drove_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Unknown archetype `{name}` (available: {available})")]
    UnknownArchetype { name: String, available: String },

    #[error("Archetype `{0}` was chosen more than once")]
    DuplicateArchetype(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid archetype: {0}")]
    Archetype(#[from] ArchetypeError),

    #[error("Unable to set up the protocol adapter: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Load run failed: {0}")]
    Load(#[from] LoadError),

    #[error("Unable to install the Prometheus exporter: {0}")]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
