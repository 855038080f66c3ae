//! Qualified names for SOAP elements, headers, and fault codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A namespace-qualified name: namespace URI plus local part, with an
/// optional preferred prefix used when the name is written back out.
///
/// Equality and hashing ignore the prefix; two names are the same element
/// regardless of how a document chose to abbreviate the namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QName {
    namespace_uri: String,
    local_part: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
}

impl QName {
    /// Create a qualified name from a namespace URI and local part.
    #[must_use]
    pub fn new(namespace_uri: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_part: local_part.into(),
            prefix: None,
        }
    }

    /// Create a name with no namespace.
    #[must_use]
    pub fn local(local_part: impl Into<String>) -> Self {
        Self::new("", local_part)
    }

    /// Attach a preferred prefix, consumed by bindings when serializing.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_part == other.local_part
    }
}

impl Eq for QName {}

impl std::hash::Hash for QName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.namespace_uri.hash(state);
        self.local_part.hash(state);
    }
}

/// Renders as `{namespace}local`, or just `local` when there is no namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_part)
        }
    }
}

/// Error parsing a `{namespace}local` qualified-name string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed qualified name: {input}")]
pub struct QNameParseError {
    input: String,
}

impl FromStr for QName {
    type Err = QNameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix('{') {
            match rest.split_once('}') {
                Some((ns, local)) if !local.is_empty() => Ok(QName::new(ns, local)),
                _ => Err(QNameParseError { input: s.to_string() }),
            }
        } else if s.is_empty() || s.contains('}') {
            Err(QNameParseError { input: s.to_string() })
        } else {
            Ok(QName::local(s))
        }
    }
}
