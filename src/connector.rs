//! The pool's single extension point for constructing a fresh stub:
//! generalizes bb8's `ManageConnection::connect`, parameterized by the
//! instance the picker chose (bb8's manager always dials one fixed target;
//! this pool dials whichever instance today's picker returns).

use std::time::Duration;

use async_trait::async_trait;

use crate::instance::Instance;
use crate::stub::Stub;
use crate::transport::{ProtocolFactory, Socket, Transport, TransportError, TransportFactory};

/// Constructs a fresh [`Stub`] for a chosen [`Instance`].
///
/// This is the seam spec.md §4.5's flowchart calls `getHbaseClient`:
/// `picker.Pick() -> socket(addr, socketTimeout) -> transportFactory.wrap ->
/// transport.open -> newStub(transport, protocolFactory)`. The pool only
/// ever calls `connect`; how that's assembled is this trait's business.
#[async_trait]
pub trait StubConnector: Send + Sync + 'static {
    /// The stub type this connector produces.
    type Stub: Stub<Error = Self::Error>;
    /// The error type both `connect` and `Self::Stub`'s RPC methods share.
    type Error: std::error::Error + Clone + PartialEq + Send + Sync + 'static;

    /// Dials and constructs a stub talking to `instance`.
    async fn connect(&self, instance: &Instance, socket_timeout: Option<Duration>) -> Result<Self::Stub, Self::Error>;
}

/// Builds a stub from a protocol binding, the last link of the §6 chain.
pub trait StubFactory: Send + Sync + 'static {
    /// The protocol binding type this factory consumes.
    type Protocol;
    /// The stub type produced.
    type Stub: Stub;

    /// Builds a stub bound to `protocol`.
    fn new_stub(&self, protocol: Self::Protocol) -> Self::Stub;
}

/// The default [`StubConnector`]: composes `Socket::connect` ->
/// `TransportFactory::get_transport` -> `Transport::open` ->
/// `StubFactory::new_stub`, in the exact order spec.md §4.5's flowchart
/// describes, so both the fine-grained seams and a single
/// `ManageConnection`-style extension point exist at once.
#[derive(Debug, Clone)]
pub struct ThriftStubConnector<TF, PF, SF> {
    transport_factory: TF,
    protocol_factory: PF,
    stub_factory: SF,
}

impl<TF, PF, SF> ThriftStubConnector<TF, PF, SF> {
    /// Assembles a connector from its three factories.
    pub fn new(transport_factory: TF, protocol_factory: PF, stub_factory: SF) -> Self {
        Self { transport_factory, protocol_factory, stub_factory }
    }
}

#[async_trait]
impl<TF, PF, SF> StubConnector for ThriftStubConnector<TF, PF, SF>
where
    TF: TransportFactory,
    PF: ProtocolFactory<Transport = TF::Transport>,
    SF: StubFactory<Protocol = PF::Protocol>,
    <SF::Stub as Stub>::Error: From<TransportError>,
{
    type Stub = SF::Stub;
    type Error = <SF::Stub as Stub>::Error;

    async fn connect(&self, instance: &Instance, socket_timeout: Option<Duration>) -> Result<Self::Stub, Self::Error> {
        let socket = TF::Socket::connect(instance.addr(), socket_timeout).await?;
        let mut transport = self.transport_factory.get_transport(socket).await?;
        transport.open().await?;
        let protocol = self.protocol_factory.new_protocol(transport);
        Ok(self.stub_factory.new_stub(protocol))
    }
}
