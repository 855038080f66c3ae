//! Per-exchange message context.
//!
//! Owns the request message, the lazily-created response, and an `Any`-typed
//! property bag used to pass cross-cutting state (observation handles,
//! security results) between interceptors and the endpoint. One context per
//! exchange; never shared across exchanges.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use soapgate_core::{MessageError, MessageFactory, WebServiceMessage};
use tracing::trace;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ResponseState
// ---------------------------------------------------------------------------

/// Response lifecycle: absent until created, absent again after clearing.
/// The state machine keeps "at most one live response" enforceable without
/// exposing a raw mutable field.
#[derive(Debug)]
enum ResponseState<M> {
    None,
    Created(M),
}

// ---------------------------------------------------------------------------
// MessageContext
// ---------------------------------------------------------------------------

/// Context for a single message exchange.
///
/// Created by the transport-facing receiver around one inbound message and
/// destroyed when the exchange completes. The request is fixed at creation;
/// the response is allocated on first [`create_response`](Self::create_response)
/// via the injected factory.
pub struct MessageContext<M: WebServiceMessage> {
    exchange_id: Uuid,
    request: M,
    response: ResponseState<M>,
    factory: Arc<dyn MessageFactory<M>>,
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl<M: WebServiceMessage> MessageContext<M> {
    /// Create a context around a request message.
    pub fn new(request: M, factory: Arc<dyn MessageFactory<M>>) -> Self {
        Self {
            exchange_id: Uuid::new_v4(),
            request,
            response: ResponseState::None,
            factory,
            properties: HashMap::new(),
        }
    }

    /// Identifier correlating all log records of this exchange.
    #[must_use]
    pub fn exchange_id(&self) -> Uuid {
        self.exchange_id
    }

    /// The request message. Fixed for the lifetime of the exchange.
    #[must_use]
    pub fn request(&self) -> &M {
        &self.request
    }

    /// Create the response message if absent and return it. Idempotent:
    /// subsequent calls return the same instance.
    ///
    /// # Errors
    ///
    /// [`MessageError::CreationFailed`] when the factory cannot allocate.
    pub fn create_response(&mut self) -> Result<&mut M, MessageError> {
        if matches!(self.response, ResponseState::None) {
            let message = self.factory.create_message()?;
            trace!(exchange_id = %self.exchange_id, "created response message");
            self.response = ResponseState::Created(message);
        }
        let ResponseState::Created(message) = &mut self.response else {
            return Err(MessageError::CreationFailed(
                "response absent after creation".to_string(),
            ));
        };
        Ok(message)
    }

    /// Whether a response has been created (and not cleared).
    #[must_use]
    pub fn has_response(&self) -> bool {
        matches!(self.response, ResponseState::Created(_))
    }

    /// The response message, if one has been created.
    #[must_use]
    pub fn response(&self) -> Option<&M> {
        match &self.response {
            ResponseState::Created(message) => Some(message),
            ResponseState::None => None,
        }
    }

    /// Mutable access to the response message, if one has been created.
    pub fn response_mut(&mut self) -> Option<&mut M> {
        match &mut self.response {
            ResponseState::Created(message) => Some(message),
            ResponseState::None => None,
        }
    }

    /// Discard the response. Used by interceptors that abort an exchange
    /// after tentatively creating one. A later `create_response` yields a
    /// fresh instance.
    pub fn clear_response(&mut self) {
        if self.has_response() {
            trace!(exchange_id = %self.exchange_id, "cleared response message");
        }
        self.response = ResponseState::None;
    }

    /// Store a property. Last write wins.
    pub fn set_property<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.properties.insert(key.into(), Box::new(value));
    }

    /// Read a property, if present and of the requested type.
    #[must_use]
    pub fn property<T: Any>(&self, key: &str) -> Option<&T> {
        self.properties.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Remove and return a property. A value of a different type than
    /// requested is left in place.
    pub fn take_property<T: Any>(&mut self, key: &str) -> Option<T> {
        let value = self.properties.remove(key)?;
        match value.downcast::<T>() {
            Ok(boxed) => Some(*boxed),
            Err(original) => {
                self.properties.insert(key.to_string(), original);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use soapgate_core::{InMemoryMessage, InMemoryMessageFactory, SoapMessage, SoapVersion};

    use super::*;

    fn make_context() -> MessageContext<InMemoryMessage> {
        MessageContext::new(
            InMemoryMessage::new(SoapVersion::Soap11).with_payload("<req/>"),
            Arc::new(InMemoryMessageFactory::new(SoapVersion::Soap11)),
        )
    }

    #[test]
    fn create_response_is_idempotent() {
        let mut ctx = make_context();
        assert!(!ctx.has_response());

        ctx.create_response().unwrap().set_payload("<resp/>".into());
        let second = ctx.create_response().unwrap();

        // Same instance: the payload written through the first borrow is
        // visible through the second.
        assert_eq!(second.payload().unwrap(), bytes::Bytes::from("<resp/>"));
        assert!(ctx.has_response());
    }

    #[test]
    fn clear_response_discards_and_allows_a_fresh_one() {
        let mut ctx = make_context();
        ctx.create_response().unwrap().set_payload("<stale/>".into());

        ctx.clear_response();
        assert!(!ctx.has_response());
        assert!(ctx.response().is_none());

        let fresh = ctx.create_response().unwrap();
        assert!(fresh.payload().unwrap().is_empty());
    }

    #[test]
    fn request_is_the_message_given_at_creation() {
        let ctx = make_context();
        assert_eq!(ctx.request().version(), SoapVersion::Soap11);
        assert_eq!(ctx.request().payload().unwrap(), bytes::Bytes::from("<req/>"));
    }

    #[test]
    fn context_is_shareable_across_task_boundaries() {
        // Dispatch futures borrow the context across awaits; losing Send
        // or Sync here breaks every async trait impl in the server crate.
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MessageContext<InMemoryMessage>>();
    }

    #[test]
    fn property_bag_is_typed_and_last_write_wins() {
        let mut ctx = make_context();

        ctx.set_property("attempts", 1u32);
        ctx.set_property("attempts", 2u32);

        assert_eq!(ctx.property::<u32>("attempts"), Some(&2));
        // Wrong type reads as absent and does not disturb the stored value.
        assert_eq!(ctx.property::<String>("attempts"), None);
        assert_eq!(ctx.take_property::<String>("attempts"), None);
        assert_eq!(ctx.take_property::<u32>("attempts"), Some(2));
        assert_eq!(ctx.property::<u32>("attempts"), None);
    }
}
