use super::{unsupported, AdapterFactory, ProtocolAdapter};
use crate::error::AdapterError;
use drove_core::{ErrorClass, Operation, Outcome, Protocol};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Builds one HTTP client per virtual user against a fixed base URL.
#[derive(Debug, Clone)]
pub struct RestAdapterFactory {
    base: Url,
    timeout: Duration,
}

impl RestAdapterFactory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let invalid = |reason: &str| AdapterError::InvalidEndpoint {
            endpoint: base_url.to_string(),
            reason: reason.to_string(),
        };

        let base = Url::parse(base_url).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if base.cannot_be_a_base() {
            return Err(invalid("not usable as a base URL"));
        }

        Ok(Self { base, timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

impl AdapterFactory for RestAdapterFactory {
    type Adapter = RestAdapter;

    async fn connect(&self) -> Result<RestAdapter, AdapterError> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(RestAdapter {
            client,
            base: self.base.clone(),
        })
    }
}

pub struct RestAdapter {
    client: Client,
    base: Url,
}

impl RestAdapter {
    fn url_for(&self, operation: &Operation) -> Option<Url> {
        let segments: &[&str] = match operation {
            Operation::ListTerms => &["terms"],
            Operation::GetTerm { term_id } => &["terms", term_id.as_str()],
            Operation::GetGraph => &["graph"],
            Operation::SearchTerms { .. } | Operation::GetTermRelations { .. } => return None,
        };

        let mut url = self.base.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(segments);
        Some(url)
    }
}

impl ProtocolAdapter for RestAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    async fn call(&self, operation: Operation) -> Outcome {
        let Some(url) = self.url_for(&operation) else {
            return unsupported(Protocol::Rest, &operation);
        };
        trace!("GET {url}");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => return transport_failure(&err),
        };

        if let Some(outcome) = classify_status(&operation, response.status()) {
            return outcome;
        }

        match response.json::<Value>().await {
            Ok(body) => decode_body(&operation, &body),
            Err(err) => transport_failure(&err),
        }
    }
}

/// Outcome decided by the status line alone, or `None` when the body must be read.
pub(crate) fn classify_status(operation: &Operation, status: StatusCode) -> Option<Outcome> {
    if status == StatusCode::NOT_FOUND {
        if operation.is_single_entity_lookup() {
            return Some(Outcome::absent());
        }
        return Some(Outcome::failure(
            ErrorClass::NotFound,
            format!("{} returned HTTP 404", operation.method_name()),
        ));
    }

    if !status.is_success() {
        return Some(Outcome::failure(
            ErrorClass::ProtocolError,
            format!("HTTP {status}"),
        ));
    }

    None
}

pub(crate) fn transport_failure(err: &reqwest::Error) -> Outcome {
    let class = if err.is_timeout() {
        ErrorClass::Timeout
    } else if err.is_connect() {
        ErrorClass::Unavailable
    } else {
        ErrorClass::ProtocolError
    };
    Outcome::failure(class, err.to_string())
}

pub(crate) fn decode_body(operation: &Operation, body: &Value) -> Outcome {
    match operation {
        Operation::ListTerms => match body.as_array() {
            Some(terms) => {
                let ids = terms.iter().filter_map(term_id).collect();
                Outcome::success(terms.len() as u64).with_entity_ids(ids)
            }
            None => malformed("expected a JSON array of terms"),
        },
        Operation::GetTerm { .. } => {
            if body.is_object() {
                Outcome::success(1)
            } else {
                malformed("expected a JSON term object")
            }
        }
        Operation::GetGraph => {
            let nodes = body.get("nodes").and_then(Value::as_array);
            let edges = body.get("edges").and_then(Value::as_array);
            match (nodes, edges) {
                (Some(nodes), Some(_)) => Outcome::success(nodes.len() as u64),
                _ => malformed("graph must carry `nodes` and `edges` arrays"),
            }
        }
        other => unsupported(Protocol::Rest, other),
    }
}

fn term_id(term: &Value) -> Option<String> {
    term.get("term")
        .or_else(|| term.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn malformed(detail: &str) -> Outcome {
    Outcome::failure(ErrorClass::ProtocolError, detail)
}
