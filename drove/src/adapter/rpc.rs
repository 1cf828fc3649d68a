use super::{unsupported, AdapterFactory, ProtocolAdapter};
use crate::error::AdapterError;
use drove_core::{ErrorClass, Operation, Outcome, Protocol};
use std::time::Duration;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

pub mod proto;

use proto::*;

/// Opens one lazily connected channel per virtual user.
#[derive(Debug, Clone)]
pub struct RpcAdapterFactory {
    endpoint: Endpoint,
    timeout: Duration,
}

impl RpcAdapterFactory {
    /// `target` is `host[:port]`, optionally with a scheme; the port defaults to 50051.
    pub fn new(target: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let uri = drove_core::rpc_endpoint(target).map_err(|err| AdapterError::InvalidEndpoint {
            endpoint: target.to_string(),
            reason: err.to_string(),
        })?;
        let endpoint = Endpoint::from_shared(uri)?.connect_timeout(timeout);
        Ok(Self { endpoint, timeout })
    }

    pub fn uri(&self) -> String {
        self.endpoint.uri().to_string()
    }
}

impl AdapterFactory for RpcAdapterFactory {
    type Adapter = RpcAdapter;

    async fn connect(&self) -> Result<RpcAdapter, AdapterError> {
        // NOTE: The channel only dials on first use, so an unreachable server shows up as
        // Unavailable outcomes rather than a failed connect.
        let channel = self.endpoint.connect_lazy();
        Ok(RpcAdapter {
            client: Grpc::new(channel),
            timeout: self.timeout,
        })
    }
}

pub struct RpcAdapter {
    client: Grpc<Channel>,
    timeout: Duration,
}

impl RpcAdapter {
    async fn unary<Req, Resp>(&self, method: &'static str, message: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut client = self.client.clone();
        client
            .ready()
            .await
            .map_err(|err| Status::unavailable(format!("Service was not ready: {err}")))?;

        let mut request = Request::new(message);
        request.set_timeout(self.timeout);
        let response = client
            .unary(request, PathAndQuery::from_static(method), ProstCodec::default())
            .await?;
        Ok(response.into_inner())
    }

    async fn dispatch(&self, operation: &Operation) -> Result<Outcome, Status> {
        let outcome = match operation {
            Operation::ListTerms => {
                let response: ListTermsResponse =
                    self.unary(LIST_TERMS, ListTermsRequest {}).await?;
                let size = response.terms.len() as u64;
                let ids = response.terms.into_iter().map(|term| term.term).collect();
                Outcome::success(size).with_entity_ids(ids)
            }
            Operation::SearchTerms { query, limit } => {
                let request = SearchTermsRequest {
                    query: query.clone(),
                    limit: i32::try_from(*limit).unwrap_or(i32::MAX),
                };
                let response: SearchTermsResponse = self.unary(SEARCH_TERMS, request).await?;
                Outcome::success(response.terms.len() as u64)
            }
            Operation::GetTerm { term_id } => {
                let request = GetTermRequest {
                    term_id: term_id.clone(),
                };
                let _term: Term = self.unary(GET_TERM, request).await?;
                Outcome::success(1)
            }
            Operation::GetTermRelations { term_id } => {
                let request = GetTermRelationsRequest {
                    term_id: term_id.clone(),
                };
                let response: GetTermRelationsResponse =
                    self.unary(GET_TERM_RELATIONS, request).await?;
                Outcome::success(response.relations.len() as u64)
            }
            Operation::GetGraph => unsupported(Protocol::Rpc, operation),
        };
        Ok(outcome)
    }
}

impl ProtocolAdapter for RpcAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rpc
    }

    async fn call(&self, operation: Operation) -> Outcome {
        match tokio::time::timeout(self.timeout, self.dispatch(&operation)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(status)) => classify_status(&operation, &status),
            Err(_) => Outcome::failure(
                ErrorClass::Timeout,
                format!(
                    "{} gave no response within {}",
                    operation.method_name(),
                    humantime::format_duration(self.timeout)
                ),
            ),
        }
    }
}

pub(crate) fn classify_status(operation: &Operation, status: &Status) -> Outcome {
    let class = match status.code() {
        Code::NotFound if operation.is_single_entity_lookup() => return Outcome::absent(),
        Code::NotFound => ErrorClass::NotFound,
        Code::DeadlineExceeded => ErrorClass::Timeout,
        Code::Unavailable => ErrorClass::Unavailable,
        _ => ErrorClass::ProtocolError,
    };
    Outcome::failure(class, format!("{:?}: {}", status.code(), status.message()))
}
