//! Dispatcher tuning knobs.

use soapgate_core::MUST_UNDERSTAND_FAULT_STRING;

/// Configuration for a SOAP dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Fault reason text used for must-understand faults.
    pub must_understand_fault_string: String,
    /// Locale tag attached to the must-understand fault reason.
    pub must_understand_fault_locale: String,
    /// Emit request and response payloads at TRACE. Payloads of
    /// non-caching messages are never read for logging.
    pub trace_payloads: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            must_understand_fault_string: MUST_UNDERSTAND_FAULT_STRING.to_string(),
            must_understand_fault_locale: "en".to_string(),
            trace_payloads: true,
        }
    }
}
