//! Endpoint interceptors: pre/post/fault/cleanup hooks around endpoint
//! invocation, plus the built-in logging and observation interceptors.

use std::time::Instant;

use async_trait::async_trait;
use soapgate_core::{SoapHeaderElement, SoapMessage, WebServiceMessage};
use tracing::{debug, info, trace};

use crate::context::MessageContext;
use crate::dispatcher::DispatchError;

use super::Endpoint;

/// Log target for payload logging, mirroring a dedicated logger category.
pub const PAYLOAD_LOG_TARGET: &str = "soapgate::payload";

/// Log target for exchange observation records.
pub const OBSERVATION_LOG_TARGET: &str = "soapgate::observation";

// ---------------------------------------------------------------------------
// ControlFlow
// ---------------------------------------------------------------------------

/// Outcome of an interceptor hook: keep going, or short-circuit the chain.
///
/// A `Stop` is normal control flow (security rejection, validation fault),
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// Proceed to the next interceptor (or the endpoint).
    Continue,
    /// Halt the current phase. The completion phase still runs.
    Stop,
}

// ---------------------------------------------------------------------------
// EndpointInterceptor trait
// ---------------------------------------------------------------------------

/// Cross-cutting hook wrapping endpoint invocation.
///
/// For one exchange the dispatcher calls `handle_request` in forward order
/// while each returns [`ControlFlow::Continue`]; `handle_response` or
/// `handle_fault` in reverse order on the interceptors that continued; and
/// `after_completion` in reverse order on exactly that subset, always.
/// All defaults are no-ops that continue.
#[async_trait]
pub trait EndpointInterceptor<M: WebServiceMessage>: Send + Sync {
    /// Called before the endpoint is invoked. Returning [`ControlFlow::Stop`]
    /// blocks the invocation; a response set by this interceptor (e.g. a
    /// fault) becomes the exchange result.
    async fn handle_request(
        &self,
        _ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        Ok(ControlFlow::Continue)
    }

    /// Called after a successful invocation when the response is not a
    /// fault. Returning [`ControlFlow::Stop`] skips earlier interceptors'
    /// post hooks.
    async fn handle_response(
        &self,
        _ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        Ok(ControlFlow::Continue)
    }

    /// Called instead of `handle_response` when the response carries a fault.
    async fn handle_fault(
        &self,
        _ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        Ok(ControlFlow::Continue)
    }

    /// Called once per exchange after everything else, regardless of
    /// outcome. `error` is the failure that ended the exchange, if any.
    /// Errors returned here are logged by the dispatcher and never mask the
    /// exchange outcome.
    async fn after_completion(
        &self,
        _ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
        _error: Option<&DispatchError>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// SOAP capability query: the SOAP view of this interceptor, if it has
    /// one. Consumed only by must-understand header processing.
    fn as_soap(&self) -> Option<&dyn SoapEndpointInterceptor<M>> {
        None
    }
}

/// A SOAP-aware interceptor that can claim understanding of mandatory
/// headers on behalf of its chain.
pub trait SoapEndpointInterceptor<M: WebServiceMessage>: EndpointInterceptor<M> {
    /// Whether this interceptor understands (processes) the given header.
    fn understands(&self, header: &SoapHeaderElement) -> bool;
}

// ---------------------------------------------------------------------------
// PayloadLoggingInterceptor
// ---------------------------------------------------------------------------

/// Logs request and response payloads at DEBUG on the
/// [`PAYLOAD_LOG_TARGET`] target.
#[derive(Debug, Clone)]
pub struct PayloadLoggingInterceptor {
    log_request: bool,
    log_response: bool,
}

impl PayloadLoggingInterceptor {
    /// Log both request and response payloads.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_request: true,
            log_response: true,
        }
    }

    /// Toggle request payload logging.
    #[must_use]
    pub fn log_request(mut self, enabled: bool) -> Self {
        self.log_request = enabled;
        self
    }

    /// Toggle response payload logging.
    #[must_use]
    pub fn log_response(mut self, enabled: bool) -> Self {
        self.log_response = enabled;
        self
    }

    fn log_payload<M: WebServiceMessage>(message: &M, direction: &'static str) {
        // A non-caching binding has exactly one payload read; it belongs
        // to the adapter, not to logging.
        if !message.is_caching() {
            trace!(
                target: PAYLOAD_LOG_TARGET,
                direction,
                "payload not logged; binding does not cache reads"
            );
            return;
        }
        match message.payload() {
            Ok(payload) => debug!(
                target: PAYLOAD_LOG_TARGET,
                direction,
                payload = %String::from_utf8_lossy(&payload),
                "payload"
            ),
            Err(err) => trace!(
                target: PAYLOAD_LOG_TARGET,
                direction,
                %err,
                "payload not readable for logging"
            ),
        }
    }
}

impl Default for PayloadLoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: WebServiceMessage> EndpointInterceptor<M> for PayloadLoggingInterceptor {
    async fn handle_request(
        &self,
        ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        if self.log_request {
            Self::log_payload(ctx.request(), "request");
        }
        Ok(ControlFlow::Continue)
    }

    async fn handle_response(
        &self,
        ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        if self.log_response {
            if let Some(response) = ctx.response() {
                Self::log_payload(response, "response");
            }
        }
        Ok(ControlFlow::Continue)
    }

    async fn handle_fault(
        &self,
        ctx: &mut MessageContext<M>,
        endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        self.handle_response(ctx, endpoint).await
    }
}

// ---------------------------------------------------------------------------
// ObservationInterceptor
// ---------------------------------------------------------------------------

const OBSERVATION_START_PROPERTY: &str = "soapgate.observation.start";

/// Records one observation record per exchange: outcome, SOAP action,
/// fault code, and duration. Emitted at INFO on the
/// [`OBSERVATION_LOG_TARGET`] target from `after_completion`, so it sees
/// the final state of the exchange.
#[derive(Debug, Clone, Default)]
pub struct ObservationInterceptor;

impl ObservationInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<M: SoapMessage> EndpointInterceptor<M> for ObservationInterceptor {
    async fn handle_request(
        &self,
        ctx: &mut MessageContext<M>,
        _endpoint: &Endpoint<M>,
    ) -> anyhow::Result<ControlFlow> {
        ctx.set_property(OBSERVATION_START_PROPERTY, Instant::now());
        Ok(ControlFlow::Continue)
    }

    async fn after_completion(
        &self,
        ctx: &mut MessageContext<M>,
        endpoint: &Endpoint<M>,
        error: Option<&DispatchError>,
    ) -> anyhow::Result<()> {
        let duration_ms = ctx
            .take_property::<Instant>(OBSERVATION_START_PROPERTY)
            .map(|start| u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));

        let fault_code = ctx
            .response()
            .and_then(SoapMessage::fault)
            .map(|fault| fault.code.to_string());

        let outcome = if error.is_some() {
            "error"
        } else if fault_code.is_some() {
            "fault"
        } else if ctx.has_response() {
            "ok"
        } else {
            "no-response"
        };

        info!(
            target: OBSERVATION_LOG_TARGET,
            exchange_id = %ctx.exchange_id(),
            endpoint_kind = endpoint.kind(),
            soap_action = ctx.request().soap_action().unwrap_or(""),
            outcome,
            fault_code = fault_code.as_deref().unwrap_or(""),
            duration_ms,
            "exchange completed"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
