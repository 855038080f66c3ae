//! Endpoint model and the strategies around it: invocation chains,
//! interceptors, mappings, adapters, and exception resolvers.

pub mod adapter;
pub mod chain;
pub mod interceptor;
pub mod mapping;
pub mod resolver;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use soapgate_core::WebServiceMessage;

use crate::context::MessageContext;

pub use adapter::{EndpointAdapter, MessageEndpointAdapter, PayloadEndpointAdapter};
pub use chain::EndpointInvocationChain;
pub use interceptor::{
    ControlFlow, EndpointInterceptor, ObservationInterceptor, PayloadLoggingInterceptor,
    SoapEndpointInterceptor,
};
pub use mapping::{EndpointMapping, PayloadRootMapping, SoapActionMapping};
pub use resolver::{EndpointExceptionResolver, SimpleSoapFaultResolver};

// ---------------------------------------------------------------------------
// Endpoint traits
// ---------------------------------------------------------------------------

/// An endpoint that works on the full message context: it reads the request
/// message and writes the response through the context.
#[async_trait]
pub trait MessageEndpoint<M: WebServiceMessage>: Send + Sync {
    /// Handle one exchange.
    async fn invoke(&self, ctx: &mut MessageContext<M>) -> anyhow::Result<()>;
}

/// An endpoint that only sees the payload region: payload in, optional
/// payload out. The adapter moves payloads between message and endpoint.
#[async_trait]
pub trait PayloadEndpoint: Send + Sync {
    /// Handle one payload. Returning `None` produces no response.
    async fn invoke(&self, payload: Bytes) -> anyhow::Result<Option<Bytes>>;
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// The application-supplied unit of logic a mapping resolves to.
///
/// A tagged union over the supported endpoint shapes; adapters match on the
/// variant to know how to call it. Cloning is shallow (shared `Arc`s), and
/// identity is pointer identity, which is what exception-resolver scoping
/// compares.
pub enum Endpoint<M: WebServiceMessage> {
    /// Full-context endpoint.
    Message(Arc<dyn MessageEndpoint<M>>),
    /// Payload-in/payload-out endpoint.
    Payload(Arc<dyn PayloadEndpoint>),
}

impl<M: WebServiceMessage> Endpoint<M> {
    /// Wrap a [`MessageEndpoint`].
    pub fn from_message_endpoint(endpoint: impl MessageEndpoint<M> + 'static) -> Self {
        Self::Message(Arc::new(endpoint))
    }

    /// Wrap a [`PayloadEndpoint`].
    pub fn from_payload_endpoint(endpoint: impl PayloadEndpoint + 'static) -> Self {
        Self::Payload(Arc::new(endpoint))
    }

    /// Short name of the endpoint shape, for logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Payload(_) => "payload",
        }
    }

    /// Whether `self` and `other` wrap the same endpoint instance.
    #[must_use]
    pub fn same_endpoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => Arc::ptr_eq(a, b),
            (Self::Payload(a), Self::Payload(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<M: WebServiceMessage> Clone for Endpoint<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Message(endpoint) => Self::Message(Arc::clone(endpoint)),
            Self::Payload(endpoint) => Self::Payload(Arc::clone(endpoint)),
        }
    }
}

impl<M: WebServiceMessage> fmt::Debug for Endpoint<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint::{}", self.kind())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
