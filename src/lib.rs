//! A client-side connection pool and dynamic endpoint selector for a
//! Thrift-framed tabular data service.
//!
//! Opening a fresh RPC connection for every call is both slow and a good way
//! to exhaust a cluster's accept queue under load. [`Pool`] maintains a set
//! of open [`Stub`] connections to whichever instances a pluggable
//! [`Discovery`] source currently reports, handing them out through
//! [`Client`] handles for repeated use and reclaiming them on `close`.
//!
//! The pool is agnostic to the wire protocol it manages: implementors of
//! [`StubConnector`] (and, beneath that, [`Socket`]/[`Transport`]/
//! [`TransportFactory`]/[`ProtocolFactory`]) provide the service-specific
//! logic to dial an [`Instance`] and construct a stub talking to it. Which
//! instance gets dialed on any given borrow is decided by a [`Balancer`],
//! refreshed periodically from `Discovery` in the background.
#![deny(missing_docs, missing_debug_implementations)]

pub mod balancer;
mod client;
mod connector;
mod discovery;
mod error;
mod instance;
#[cfg(test)]
mod mock;
pub mod model;
mod pool;
mod stub;
mod transport;

pub use balancer::{Balancer, NoInstance, Picker, RandomBalancer, RoundRobinBalancer, WeightedRoundRobinBalancer};
pub use client::Client;
pub use connector::{StubConnector, StubFactory, ThriftStubConnector};
pub use discovery::{Discovery, DiscoveryError, StaticDiscovery};
pub use error::{ClientError, ErrorList, PoolError};
pub use instance::{Instance, InstanceBuilder};
pub use pool::{HealthChecker, Pool, PoolBuilder};
pub use stub::Stub;
pub use transport::{ProtocolFactory, Socket, Transport, TransportError, TransportFactory};
