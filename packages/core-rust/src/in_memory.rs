//! In-memory SOAP message binding.
//!
//! A caching implementation of the message contracts, used as the test
//! binding throughout the workspace and adequate for deployments that
//! already hold the whole envelope in memory. A single-read mode models
//! streaming bindings whose payload can only be consumed once.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;

use crate::fault::SoapFault;
use crate::header::SoapHeaderElement;
use crate::message::{MessageError, MessageFactory, SoapMessage, WebServiceMessage};
use crate::soap::SoapVersion;

/// In-memory SOAP message. Payload, headers, and fault live on the struct.
#[derive(Debug)]
pub struct InMemoryMessage {
    version: SoapVersion,
    soap_action: Option<String>,
    headers: Vec<SoapHeaderElement>,
    payload: Bytes,
    fault: Option<SoapFault>,
    single_read: bool,
    consumed: AtomicBool,
}

impl InMemoryMessage {
    /// Create an empty message for the given SOAP version.
    #[must_use]
    pub fn new(version: SoapVersion) -> Self {
        Self {
            version,
            soap_action: None,
            headers: Vec::new(),
            payload: Bytes::new(),
            fault: None,
            single_read: false,
            consumed: AtomicBool::new(false),
        }
    }

    /// Set the initial payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the SOAP action.
    #[must_use]
    pub fn with_soap_action(mut self, action: impl Into<String>) -> Self {
        self.soap_action = Some(action.into());
        self
    }

    /// Add a header element.
    #[must_use]
    pub fn with_header(mut self, element: SoapHeaderElement) -> Self {
        self.headers.push(element);
        self
    }

    /// Switch to single-read mode: the payload can be read exactly once,
    /// like a streaming binding.
    #[must_use]
    pub fn single_read(mut self) -> Self {
        self.single_read = true;
        self
    }
}

impl WebServiceMessage for InMemoryMessage {
    fn payload(&self) -> Result<Bytes, MessageError> {
        if self.single_read && self.consumed.swap(true, Ordering::Relaxed) {
            return Err(MessageError::PayloadConsumed);
        }
        Ok(self.payload.clone())
    }

    fn set_payload(&mut self, payload: Bytes) {
        self.payload = payload;
        self.consumed.store(false, Ordering::Relaxed);
    }

    fn is_caching(&self) -> bool {
        !self.single_read
    }

    fn has_fault(&self) -> bool {
        self.fault.is_some()
    }

    fn fault_reason(&self) -> Option<String> {
        self.fault.as_ref().map(|f| f.reason.clone())
    }
}

impl SoapMessage for InMemoryMessage {
    fn version(&self) -> SoapVersion {
        self.version
    }

    fn soap_action(&self) -> Option<&str> {
        self.soap_action.as_deref()
    }

    fn header_elements(&self) -> &[SoapHeaderElement] {
        &self.headers
    }

    fn add_header_element(&mut self, element: SoapHeaderElement) {
        self.headers.push(element);
    }

    fn set_fault(&mut self, fault: SoapFault) {
        self.fault = Some(fault);
    }

    fn fault(&self) -> Option<&SoapFault> {
        self.fault.as_ref()
    }
}

/// Factory producing empty [`InMemoryMessage`] responses in a fixed version.
#[derive(Debug, Clone, Copy)]
pub struct InMemoryMessageFactory {
    version: SoapVersion,
}

impl InMemoryMessageFactory {
    /// Create a factory for the given SOAP version.
    #[must_use]
    pub fn new(version: SoapVersion) -> Self {
        Self { version }
    }
}

impl MessageFactory<InMemoryMessage> for InMemoryMessageFactory {
    fn create_message(&self) -> Result<InMemoryMessage, MessageError> {
        Ok(InMemoryMessage::new(self.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qname::QName;

    #[test]
    fn caching_payload_reads_are_idempotent() {
        let message = InMemoryMessage::new(SoapVersion::Soap11).with_payload("<a/>");

        assert!(message.is_caching());
        assert_eq!(message.payload().unwrap(), Bytes::from("<a/>"));
        assert_eq!(message.payload().unwrap(), Bytes::from("<a/>"));
    }

    #[test]
    fn single_read_payload_is_consumed() {
        let message = InMemoryMessage::new(SoapVersion::Soap11)
            .with_payload("<a/>")
            .single_read();

        assert!(!message.is_caching());
        assert_eq!(message.payload().unwrap(), Bytes::from("<a/>"));
        assert_eq!(message.payload(), Err(MessageError::PayloadConsumed));
    }

    #[test]
    fn writing_a_payload_resets_consumption() {
        let mut message = InMemoryMessage::new(SoapVersion::Soap12)
            .with_payload("<a/>")
            .single_read();

        let _ = message.payload();
        message.set_payload(Bytes::from("<b/>"));

        assert_eq!(message.payload().unwrap(), Bytes::from("<b/>"));
    }

    #[test]
    fn fault_marker_reflects_the_fault_slot() {
        let mut message = InMemoryMessage::new(SoapVersion::Soap12);

        assert!(!message.has_fault());
        assert_eq!(message.fault_reason(), None);

        message.set_fault(SoapFault::server_or_receiver(SoapVersion::Soap12, "backend down"));

        assert!(message.has_fault());
        assert_eq!(message.fault_reason().as_deref(), Some("backend down"));
        assert_eq!(message.fault().unwrap().code.local_part(), "Receiver");
    }

    #[test]
    fn headers_accumulate_in_order() {
        let mut message = InMemoryMessage::new(SoapVersion::Soap12)
            .with_header(SoapHeaderElement::new(QName::new("urn:a", "First")));
        message.add_header_element(SoapHeaderElement::new(QName::new("urn:b", "Second")));

        let names: Vec<_> = message
            .header_elements()
            .iter()
            .map(|h| h.name.local_part().to_string())
            .collect();

        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn factory_creates_empty_messages_of_its_version() {
        let factory = InMemoryMessageFactory::new(SoapVersion::Soap12);
        let message = factory.create_message().unwrap();

        assert_eq!(message.version(), SoapVersion::Soap12);
        assert!(!message.has_fault());
        assert!(message.payload().unwrap().is_empty());
    }
}
