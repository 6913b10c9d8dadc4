//! The socket/transport/protocol seams spec.md §6 specifies only where the
//! pool core consumes them: `Socket` dials an address, a `TransportFactory`
//! wraps the dialed socket, `Transport` opens/closes it, and a
//! `ProtocolFactory` produces the per-connection protocol binding the stub
//! is built from. The concrete Thrift implementations of these are out of
//! scope (spec.md §1); only the traits are.

use std::time::Duration;

use async_trait::async_trait;

/// Boxed error for the transport-construction chain; `StubConnector::Error`
/// must be constructible from one (spec.md §7 taxonomy item 4).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A dialed socket to one instance's address, with an optional socket-level
/// timeout (spec.md §4.5: `socketTimeout == 0` means no timeout).
#[async_trait]
pub trait Socket: Send + Sync + Sized + 'static {
    /// Dials `addr`, honoring `timeout` if set.
    async fn connect(addr: &str, timeout: Option<Duration>) -> Result<Self, TransportError>;
}

/// An opened byte-stream layered over a [`Socket`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Completes the handshake/framing setup so RPCs may flow.
    async fn open(&mut self) -> Result<(), TransportError>;
    /// Tears down the transport. Best-effort: callers in the pool's destroy
    /// paths do not propagate this error (spec.md §7 taxonomy item 6).
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Wraps a dialed [`Socket`] in a [`Transport`], spec.md §6's `GetTransport`.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    /// The socket type this factory wraps.
    type Socket: Socket;
    /// The transport type this factory produces.
    type Transport: Transport;

    /// Wraps `socket` in a fresh, unopened transport.
    async fn get_transport(&self, socket: Self::Socket) -> Result<Self::Transport, TransportError>;
}

/// Produces the per-connection protocol binding a [`StubFactory`](crate::connector::StubFactory)
/// builds a stub from, spec.md §6's "protocol factory produces per-connection
/// protocol bindings for the stub".
pub trait ProtocolFactory: Send + Sync + 'static {
    /// The transport type this factory binds a protocol over.
    type Transport: Transport;
    /// The protocol binding type produced.
    type Protocol: Send + Sync + 'static;

    /// Binds a protocol to an already-open `transport`.
    fn new_protocol(&self, transport: Self::Transport) -> Self::Protocol;
}
