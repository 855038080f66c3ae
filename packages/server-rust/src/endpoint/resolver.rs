//! Exception resolvers: translate endpoint invocation errors into
//! response messages instead of letting the exchange abort.

use async_trait::async_trait;
use soapgate_core::{SoapFault, SoapMessage, WebServiceMessage};
use tracing::warn;

use crate::context::MessageContext;

use super::Endpoint;

// ---------------------------------------------------------------------------
// EndpointExceptionResolver trait
// ---------------------------------------------------------------------------

/// Strategy turning an endpoint invocation error into a response.
///
/// Resolvers run in registration order; the first to return `true` wins.
#[async_trait]
pub trait EndpointExceptionResolver<M: WebServiceMessage>: Send + Sync {
    /// Endpoints this resolver is scoped to. `None` means it applies to
    /// every endpoint.
    fn mapped_endpoints(&self) -> Option<&[Endpoint<M>]> {
        None
    }

    /// Attempt to resolve `error` into a response on `ctx`. Returns `true`
    /// when the error is handled and the exchange should continue with the
    /// produced response.
    async fn resolve_exception(
        &self,
        ctx: &mut MessageContext<M>,
        endpoint: Option<&Endpoint<M>>,
        error: &anyhow::Error,
    ) -> bool;
}

// ---------------------------------------------------------------------------
// SimpleSoapFaultResolver
// ---------------------------------------------------------------------------

/// Resolves any endpoint error into a server-side SOAP fault whose reason
/// text is the error's display form.
pub struct SimpleSoapFaultResolver<M: SoapMessage> {
    scope: Option<Vec<Endpoint<M>>>,
    log_errors: bool,
}

impl<M: SoapMessage> SimpleSoapFaultResolver<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scope: None,
            log_errors: true,
        }
    }

    /// Restrict this resolver to the given endpoints.
    #[must_use]
    pub fn scoped_to(mut self, endpoints: Vec<Endpoint<M>>) -> Self {
        self.scope = Some(endpoints);
        self
    }

    /// Whether resolved errors are logged at WARN. Defaults to true.
    #[must_use]
    pub fn log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }
}

impl<M: SoapMessage> Default for SimpleSoapFaultResolver<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: SoapMessage> EndpointExceptionResolver<M> for SimpleSoapFaultResolver<M> {
    fn mapped_endpoints(&self) -> Option<&[Endpoint<M>]> {
        self.scope.as_deref()
    }

    async fn resolve_exception(
        &self,
        ctx: &mut MessageContext<M>,
        _endpoint: Option<&Endpoint<M>>,
        error: &anyhow::Error,
    ) -> bool {
        if self.log_errors {
            warn!(exchange_id = %ctx.exchange_id(), error = %error, "resolving endpoint error as soap fault");
        }
        let version = ctx.request().version();
        let Ok(response) = ctx.create_response() else {
            return false;
        };
        response.set_fault(SoapFault::server_or_receiver(version, error.to_string()));
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
