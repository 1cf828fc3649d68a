//! Stub adapters for unit tests.
use crate::adapter::{AdapterFactory, ProtocolAdapter};
use crate::error::AdapterError;
use drove_core::{Operation, Outcome, Protocol};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct StubAdapter {
    pub calls: AtomicUsize,
}

impl ProtocolAdapter for StubAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rpc
    }

    async fn call(&self, _operation: Operation) -> Outcome {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Outcome::success(1)
    }
}

/// Hands out stub adapters, refusing the connects listed in `refuse` (0-based).
#[derive(Debug, Default, Clone)]
pub(crate) struct StubFactory {
    pub connects: Arc<AtomicUsize>,
    pub refuse: Vec<usize>,
}

impl AdapterFactory for StubFactory {
    type Adapter = StubAdapter;

    async fn connect(&self) -> Result<StubAdapter, AdapterError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.contains(&attempt) {
            return Err(AdapterError::InvalidEndpoint {
                endpoint: "stub".to_string(),
                reason: format!("connect #{attempt} refused"),
            });
        }
        Ok(StubAdapter::default())
    }
}
