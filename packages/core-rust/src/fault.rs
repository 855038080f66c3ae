//! SOAP fault model. Faults are plain values attached to a message body,
//! not exceptions; the dispatch layer decides when one becomes terminal.

use crate::qname::QName;
use crate::soap::SoapVersion;

/// Fault string used for MustUnderstand faults.
pub const MUST_UNDERSTAND_FAULT_STRING: &str = "SOAP Must Understand Error";

/// A SOAP fault: code, human-readable reason, and optional role/detail.
///
/// `reason` maps to the SOAP 1.1 faultstring and the SOAP 1.2 reason text;
/// `reason_locale` is its language tag. `role` maps to faultactor (1.1) or
/// the fault role (1.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// Qualified fault code, e.g. `{envelope-ns}MustUnderstand`.
    pub code: QName,
    /// Fault string (1.1) or reason text (1.2).
    pub reason: String,
    /// Language tag of the reason text.
    pub reason_locale: String,
    /// Actor (1.1) or role (1.2) in which the fault occurred.
    pub role: Option<String>,
    /// Application-specific detail payload.
    pub detail: Option<String>,
}

impl SoapFault {
    /// Create a fault with an English reason.
    #[must_use]
    pub fn new(code: QName, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            reason_locale: "en".to_string(),
            role: None,
            detail: None,
        }
    }

    /// Override the reason language tag.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.reason_locale = locale.into();
        self
    }

    /// Attach the actor/role URI in which the fault occurred.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Attach a detail payload.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Standard MustUnderstand fault for the given version.
    #[must_use]
    pub fn must_understand(version: SoapVersion) -> Self {
        Self::new(version.must_understand_fault_name(), MUST_UNDERSTAND_FAULT_STRING)
    }

    /// Sender/Client fault: the request itself was at fault.
    #[must_use]
    pub fn client_or_sender(version: SoapVersion, reason: impl Into<String>) -> Self {
        Self::new(version.client_or_sender_fault_name(), reason)
    }

    /// Receiver/Server fault: this node failed to process the request.
    #[must_use]
    pub fn server_or_receiver(version: SoapVersion, reason: impl Into<String>) -> Self {
        Self::new(version.server_or_receiver_fault_name(), reason)
    }

    /// VersionMismatch fault for an envelope in the wrong namespace.
    #[must_use]
    pub fn version_mismatch(version: SoapVersion) -> Self {
        Self::new(version.version_mismatch_fault_name(), "Version Mismatch")
    }
}
