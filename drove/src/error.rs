use drove_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArchetypeError {
    #[error("Archetype `{0}` has no actions")]
    NoActions(String),

    #[error("Weighted table is empty")]
    EmptyTable,

    #[error("Weight of `{0}` must be greater than zero")]
    ZeroWeight(String),

    #[error("Action `{action}` is defined twice in archetype `{archetype}`")]
    DuplicateAction { archetype: String, action: String },

    #[error("Archetype `{archetype}` has an invalid think time: {reason}")]
    InvalidThinkTime { archetype: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No archetypes were provided")]
    EmptyMix,

    #[error(transparent)]
    Archetype(#[from] ArchetypeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Probe connection failed: {0}")]
    Probe(#[from] AdapterError),
}
