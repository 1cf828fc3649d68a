#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod adapter;
pub mod archetype;
pub mod emitter;
pub mod error;
pub mod lifecycle;
pub mod limiter;
pub mod scheduler;
pub mod select;

pub(crate) mod timed;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{AdapterFactory, ProtocolAdapter};
pub use archetype::{Action, ActionContext, Archetype, ArchetypeBuilder};
pub use error::{AdapterError, ArchetypeError, LoadError};
pub use lifecycle::{LoadTest, RunningLoad};

pub mod prelude {
    pub use crate::adapter::{
        AdapterFactory, ProtocolAdapter, RestAdapter, RestAdapterFactory, RpcAdapter,
        RpcAdapterFactory,
    };
    pub use crate::archetype::{ActionContext, Archetype};
    #[cfg(feature = "metrics")]
    pub use crate::emitter::MetricsSink;
    pub use crate::emitter::{BucketSink, ChannelSink, MeasurementSink, Tee};
    pub use crate::lifecycle::{LoadTest, RunningLoad};

    pub use drove_core::{
        ErrorClass, MeasurementEvent, Operation, Outcome, Protocol, RunStatistics, SeedError,
        SessionState, ThinkTime,
    };
}
