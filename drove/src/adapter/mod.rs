//! Protocol adapters: one `call(operation) -> Outcome` per wire protocol.
//!
//! Adapters never fail: every transport or decoding problem is folded into the returned
//! [`Outcome`]. Only establishing the adapter, through an [`AdapterFactory`], can fail.
use crate::error::AdapterError;
use drove_core::{Operation, Outcome, Protocol};
use std::future::Future;

pub mod rest;
pub mod rpc;

pub use rest::{RestAdapter, RestAdapterFactory};
pub use rpc::{RpcAdapter, RpcAdapterFactory};

pub trait ProtocolAdapter: Send + Sync + 'static {
    fn protocol(&self) -> Protocol;

    fn call(&self, operation: Operation) -> impl Future<Output = Outcome> + Send;
}

/// Produces a fresh adapter for each virtual user.
pub trait AdapterFactory: Send + Sync + 'static {
    type Adapter: ProtocolAdapter;

    fn connect(&self) -> impl Future<Output = Result<Self::Adapter, AdapterError>> + Send;
}

pub(crate) fn unsupported(protocol: Protocol, operation: &Operation) -> Outcome {
    Outcome::failure(
        drove_core::ErrorClass::ProtocolError,
        format!("{} is not offered over {protocol}", operation.method_name()),
    )
}
