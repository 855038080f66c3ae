//! SOAP version vocabulary: envelope namespaces, actor/role URIs, and
//! standard fault-code names for SOAP 1.1 and SOAP 1.2.

use serde::{Deserialize, Serialize};

use crate::qname::QName;

/// SOAP 1.1 envelope namespace URI.
pub const SOAP_11_NAMESPACE_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.2 envelope namespace URI.
pub const SOAP_12_NAMESPACE_URI: &str = "http://www.w3.org/2003/05/soap-envelope";

/// SOAP 1.1 "next" actor URI.
pub const SOAP_11_NEXT_ACTOR_URI: &str = "http://schemas.xmlsoap.org/soap/actor/next";

/// SOAP 1.2 "next" role URI.
pub const SOAP_12_NEXT_ROLE_URI: &str = "http://www.w3.org/2003/05/soap-envelope/role/next";

/// SOAP 1.2 "none" role URI. Headers in this role are never processed.
pub const SOAP_12_NONE_ROLE_URI: &str = "http://www.w3.org/2003/05/soap-envelope/role/none";

/// SOAP 1.2 "ultimate receiver" role URI.
pub const SOAP_12_ULTIMATE_RECEIVER_ROLE_URI: &str =
    "http://www.w3.org/2003/05/soap-envelope/role/ultimateReceiver";

/// A specific version of the SOAP specification. Selects the envelope
/// namespace, actor/role addressing URIs, and fault-code vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapVersion {
    /// SOAP 1.1 (actor-based addressing, fault code + fault string).
    Soap11,
    /// SOAP 1.2 (role-based addressing, fault reason + `NotUnderstood` headers).
    Soap12,
}

impl SoapVersion {
    /// The envelope namespace URI for this version.
    #[must_use]
    pub fn envelope_namespace_uri(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NAMESPACE_URI,
            Self::Soap12 => SOAP_12_NAMESPACE_URI,
        }
    }

    /// The URI addressing the next node that processes the message.
    #[must_use]
    pub fn next_actor_or_role_uri(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NEXT_ACTOR_URI,
            Self::Soap12 => SOAP_12_NEXT_ROLE_URI,
        }
    }

    /// The URI for headers that must never be directly processed.
    /// SOAP 1.1 has no such actor; returns the empty string.
    #[must_use]
    pub fn none_actor_or_role_uri(self) -> &'static str {
        match self {
            Self::Soap11 => "",
            Self::Soap12 => SOAP_12_NONE_ROLE_URI,
        }
    }

    /// The URI for headers addressed to the ultimate receiver.
    /// SOAP 1.1 expresses this by omitting the actor; returns the empty string.
    #[must_use]
    pub fn ultimate_receiver_role_uri(self) -> &'static str {
        match self {
            Self::Soap11 => "",
            Self::Soap12 => SOAP_12_ULTIMATE_RECEIVER_ROLE_URI,
        }
    }

    /// The MIME content type for messages of this version.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml",
            Self::Soap12 => "application/soap+xml",
        }
    }

    /// Qualified name of the `mustUnderstand` attribute.
    #[must_use]
    pub fn must_understand_attribute_name(self) -> QName {
        QName::new(self.envelope_namespace_uri(), "mustUnderstand")
    }

    /// Qualified name of the `actor` (1.1) or `role` (1.2) attribute.
    #[must_use]
    pub fn actor_or_role_attribute_name(self) -> QName {
        match self {
            Self::Soap11 => QName::new(SOAP_11_NAMESPACE_URI, "actor"),
            Self::Soap12 => QName::new(SOAP_12_NAMESPACE_URI, "role"),
        }
    }

    /// Fault code for a mandatory header that was not understood.
    #[must_use]
    pub fn must_understand_fault_name(self) -> QName {
        QName::new(self.envelope_namespace_uri(), "MustUnderstand")
    }

    /// Fault code for an envelope in an unsupported version namespace.
    #[must_use]
    pub fn version_mismatch_fault_name(self) -> QName {
        QName::new(self.envelope_namespace_uri(), "VersionMismatch")
    }

    /// Fault code blaming the sender: `Client` (1.1) or `Sender` (1.2).
    #[must_use]
    pub fn client_or_sender_fault_name(self) -> QName {
        match self {
            Self::Soap11 => QName::new(SOAP_11_NAMESPACE_URI, "Client"),
            Self::Soap12 => QName::new(SOAP_12_NAMESPACE_URI, "Sender"),
        }
    }

    /// Fault code blaming this node: `Server` (1.1) or `Receiver` (1.2).
    #[must_use]
    pub fn server_or_receiver_fault_name(self) -> QName {
        match self {
            Self::Soap11 => QName::new(SOAP_11_NAMESPACE_URI, "Server"),
            Self::Soap12 => QName::new(SOAP_12_NAMESPACE_URI, "Receiver"),
        }
    }
}

impl std::fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soap11 => write!(f, "SOAP 1.1"),
            Self::Soap12 => write!(f, "SOAP 1.2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soap11_vocabulary() {
        let v = SoapVersion::Soap11;

        assert_eq!(v.envelope_namespace_uri(), "http://schemas.xmlsoap.org/soap/envelope/");
        assert_eq!(v.next_actor_or_role_uri(), "http://schemas.xmlsoap.org/soap/actor/next");
        assert_eq!(v.none_actor_or_role_uri(), "");
        assert_eq!(v.content_type(), "text/xml");
        assert_eq!(
            v.must_understand_fault_name().to_string(),
            "{http://schemas.xmlsoap.org/soap/envelope/}MustUnderstand"
        );
        assert_eq!(v.server_or_receiver_fault_name().local_part(), "Server");
        assert_eq!(v.client_or_sender_fault_name().local_part(), "Client");
    }

    #[test]
    fn soap12_vocabulary() {
        let v = SoapVersion::Soap12;

        assert_eq!(v.envelope_namespace_uri(), "http://www.w3.org/2003/05/soap-envelope");
        assert_eq!(
            v.next_actor_or_role_uri(),
            "http://www.w3.org/2003/05/soap-envelope/role/next"
        );
        assert_eq!(
            v.ultimate_receiver_role_uri(),
            "http://www.w3.org/2003/05/soap-envelope/role/ultimateReceiver"
        );
        assert_eq!(v.content_type(), "application/soap+xml");
        assert_eq!(
            v.must_understand_fault_name().to_string(),
            "{http://www.w3.org/2003/05/soap-envelope}MustUnderstand"
        );
        assert_eq!(v.server_or_receiver_fault_name().local_part(), "Receiver");
        assert_eq!(v.client_or_sender_fault_name().local_part(), "Sender");
    }
}
