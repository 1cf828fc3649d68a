use crate::outcome::Outcome;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Protocol {
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "RPC")]
    Rpc,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Rest => f.write_str("REST"),
            Protocol::Rpc => f.write_str("RPC"),
        }
    }
}

/// Record of one action execution, handed to a measurement sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementEvent {
    pub protocol: Protocol,
    pub operation: String,
    pub latency_millis: u64,
    pub result_size: u64,
    pub failed: bool,
    pub error_detail: Option<String>,
}

impl MeasurementEvent {
    pub fn from_outcome(protocol: Protocol, operation: &str, outcome: &Outcome) -> Self {
        let error_detail = outcome.error_class().map(|class| match outcome.detail() {
            Some(detail) if !detail.is_empty() => format!("{class}: {detail}"),
            _ => class.to_string(),
        });

        Self {
            protocol,
            operation: operation.to_string(),
            latency_millis: u64::try_from(outcome.latency().as_millis()).unwrap_or(u64::MAX),
            result_size: outcome.result_size(),
            failed: !outcome.is_success(),
            error_detail,
        }
    }
}
