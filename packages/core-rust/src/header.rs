//! SOAP header element data: name, must-understand marker, actor/role
//! targeting, and text content.

use crate::qname::QName;
use crate::soap::SOAP_12_NAMESPACE_URI;

/// A single element of a SOAP header block, as surfaced by a binding.
///
/// Bindings produce these when reading an envelope; the dispatch layer
/// consumes the `must_understand` and `actor_or_role` attributes for
/// routing decisions and appends new elements (e.g. `NotUnderstood`) to
/// response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapHeaderElement {
    /// Qualified name of the header element.
    pub name: QName,
    /// Whether the `mustUnderstand` attribute is set.
    pub must_understand: bool,
    /// The `actor` (SOAP 1.1) or `role` (SOAP 1.2) attribute, if present.
    pub actor_or_role: Option<String>,
    /// Text content of the element.
    pub text: String,
}

impl SoapHeaderElement {
    /// Create a plain header element with no attributes set.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            must_understand: false,
            actor_or_role: None,
            text: String::new(),
        }
    }

    /// Mark the element as must-understand.
    #[must_use]
    pub fn must_understand(mut self) -> Self {
        self.must_understand = true;
        self
    }

    /// Target the element at a specific actor (1.1) or role (1.2) URI.
    #[must_use]
    pub fn for_actor_or_role(mut self, uri: impl Into<String>) -> Self {
        self.actor_or_role = Some(uri.into());
        self
    }

    /// Set the element's text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Build a SOAP 1.2 `NotUnderstood` element naming a mandatory header
    /// that no node participant recognized. Placed in the response header
    /// alongside a MustUnderstand fault.
    #[must_use]
    pub fn not_understood(header_name: &QName) -> Self {
        Self::new(QName::new(SOAP_12_NAMESPACE_URI, "NotUnderstood")).with_text(header_name.to_string())
    }
}
