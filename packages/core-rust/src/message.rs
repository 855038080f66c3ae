//! Message contracts implemented by XML-binding crates.
//!
//! The dispatch layer only sees these traits; whether an envelope is backed
//! by a cached DOM, a streaming reader, or the in-memory binding in
//! [`crate::in_memory`] is a binding concern.

use bytes::Bytes;

use crate::fault::SoapFault;
use crate::header::SoapHeaderElement;
use crate::soap::SoapVersion;

/// Errors from reading, writing, or creating messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    /// The payload was already read once and the binding does not cache.
    #[error("payload already consumed; this binding does not cache payload reads")]
    PayloadConsumed,
    /// The binding failed to allocate a new message.
    #[error("message creation failed: {0}")]
    CreationFailed(String),
}

/// An inbound or outbound web-service document with a payload region and a
/// fault marker.
///
/// Payload reads are not necessarily idempotent: a streaming binding may
/// return [`MessageError::PayloadConsumed`] on a second read. Callers that
/// need repeated reads must check [`is_caching`](Self::is_caching) first.
///
/// Messages cross task boundaries inside shared dispatch futures, so
/// implementations must be `Send + Sync`.
pub trait WebServiceMessage: Send + Sync + 'static {
    /// Read the payload region.
    ///
    /// # Errors
    ///
    /// [`MessageError::PayloadConsumed`] if the backing store is streaming
    /// and the payload was already read.
    fn payload(&self) -> Result<Bytes, MessageError>;

    /// Replace the payload region.
    fn set_payload(&mut self, payload: Bytes);

    /// Whether payload reads are idempotent for this binding.
    fn is_caching(&self) -> bool;

    /// Whether this message carries a fault.
    fn has_fault(&self) -> bool;

    /// Human-readable fault reason, when a fault is present.
    fn fault_reason(&self) -> Option<String>;
}

/// A SOAP envelope: a [`WebServiceMessage`] plus header access, a typed
/// fault slot, and the SOAP version tag that selects fault vocabulary.
pub trait SoapMessage: WebServiceMessage {
    /// The SOAP version this envelope is expressed in.
    fn version(&self) -> SoapVersion;

    /// The SOAP action associated with this message, if the transport or
    /// envelope carried one.
    fn soap_action(&self) -> Option<&str>;

    /// Header elements of the envelope, in document order.
    fn header_elements(&self) -> &[SoapHeaderElement];

    /// Append a header element (e.g. a SOAP 1.2 `NotUnderstood` block).
    fn add_header_element(&mut self, element: SoapHeaderElement);

    /// Replace the body with a fault.
    fn set_fault(&mut self, fault: SoapFault);

    /// The fault in the body, if any.
    fn fault(&self) -> Option<&SoapFault>;
}

/// Creates response messages. Injected into the message context so the
/// response is only allocated when something actually produces one.
pub trait MessageFactory<M>: Send + Sync {
    /// Allocate a fresh, empty message.
    ///
    /// # Errors
    ///
    /// [`MessageError::CreationFailed`] if the binding cannot allocate.
    fn create_message(&self) -> Result<M, MessageError>;
}
