//! Central message dispatcher: resolves an endpoint for each incoming
//! message, drives its interceptor chain, and invokes it through an
//! adapter, with pluggable exception resolution.

use std::sync::Arc;

use async_trait::async_trait;
use soapgate_core::{MessageError, WebServiceMessage};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::context::MessageContext;
use crate::endpoint::{
    ControlFlow, Endpoint, EndpointAdapter, EndpointExceptionResolver, EndpointInvocationChain,
    EndpointMapping,
};

/// Log target for requests that no mapping claimed. Lets deployments
/// silence or redirect "endpoint not found" noise independently.
pub const ENDPOINT_NOT_FOUND_LOG_TARGET: &str = "soapgate::endpoint_not_found";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Terminal outcome of a failed dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered mapping produced an endpoint for the request.
    #[error("no endpoint mapping found for request")]
    NoEndpointFound,
    /// An endpoint was resolved but no adapter supports its kind.
    #[error("no adapter for endpoint of kind `{endpoint_kind}`")]
    NoAdapter { endpoint_kind: &'static str },
    /// An endpoint mapping failed while resolving the request.
    #[error("endpoint mapping failed")]
    Mapping(#[source] anyhow::Error),
    /// An interceptor hook returned an error.
    #[error("interceptor failed")]
    Interceptor(#[source] anyhow::Error),
    /// The endpoint invocation failed and no resolver handled the error.
    #[error("endpoint invocation failed")]
    Endpoint(#[source] anyhow::Error),
    /// Reading or creating a message failed.
    #[error(transparent)]
    Message(#[from] MessageError),
}

// ---------------------------------------------------------------------------
// Dispatch seams
// ---------------------------------------------------------------------------

/// Hook that runs after endpoint resolution and before any interceptor.
///
/// [`ControlFlow::Stop`] ends the exchange immediately with whatever
/// response the hook produced; no interceptor hook runs in that case.
/// The SOAP must-understand check plugs in here.
#[async_trait]
pub trait ChainPrecheck<M: WebServiceMessage>: Send + Sync {
    async fn handle_request(
        &self,
        chain: &EndpointInvocationChain<M>,
        ctx: &mut MessageContext<M>,
    ) -> Result<ControlFlow, DispatchError>;
}

/// Entry point a transport hands a populated context to.
#[async_trait]
pub trait MessageReceiver<M: WebServiceMessage>: Send + Sync {
    async fn receive(&self, ctx: &mut MessageContext<M>) -> Result<(), DispatchError>;
}

// ---------------------------------------------------------------------------
// MessageDispatcher
// ---------------------------------------------------------------------------

/// Protocol-agnostic dispatcher over an ordered set of mappings, adapters
/// and exception resolvers.
///
/// One instance serves many concurrent exchanges; every strategy it holds
/// is shared and immutable after construction.
pub struct MessageDispatcher<M: WebServiceMessage> {
    mappings: Vec<Arc<dyn EndpointMapping<M>>>,
    adapters: Vec<Arc<dyn EndpointAdapter<M>>>,
    resolvers: Vec<Arc<dyn EndpointExceptionResolver<M>>>,
    precheck: Option<Arc<dyn ChainPrecheck<M>>>,
    trace_payloads: bool,
}

impl<M: WebServiceMessage> MessageDispatcher<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
            adapters: Vec::new(),
            resolvers: Vec::new(),
            precheck: None,
            trace_payloads: true,
        }
    }

    /// Append a mapping. Mappings are consulted in registration order and
    /// the first match wins.
    pub fn add_mapping(&mut self, mapping: Arc<dyn EndpointMapping<M>>) {
        self.mappings.push(mapping);
    }

    /// Append an adapter. The first adapter whose `supports` accepts the
    /// resolved endpoint performs the invocation.
    pub fn add_adapter(&mut self, adapter: Arc<dyn EndpointAdapter<M>>) {
        self.adapters.push(adapter);
    }

    /// Append an exception resolver. Resolvers run in registration order
    /// and the first to handle the error wins.
    pub fn add_resolver(&mut self, resolver: Arc<dyn EndpointExceptionResolver<M>>) {
        self.resolvers.push(resolver);
    }

    /// Install the pre-interceptor chain check.
    pub fn set_precheck(&mut self, precheck: Arc<dyn ChainPrecheck<M>>) {
        self.precheck = Some(precheck);
    }

    /// Enable or disable TRACE payload logging in [`MessageReceiver::receive`].
    pub fn set_trace_payloads(&mut self, trace_payloads: bool) {
        self.trace_payloads = trace_payloads;
    }

    /// Run one exchange to completion.
    ///
    /// Interceptor bookkeeping invariant: `after_completion` runs, in
    /// reverse order, on exactly the prefix of interceptors whose
    /// `handle_request` was entered, no matter how the exchange ends.
    pub async fn dispatch(&self, ctx: &mut MessageContext<M>) -> Result<(), DispatchError> {
        let Some(chain) = self.resolve_endpoint(ctx).await? else {
            warn!(
                target: ENDPOINT_NOT_FOUND_LOG_TARGET,
                exchange_id = %ctx.exchange_id(),
                "no endpoint found for request"
            );
            return Err(DispatchError::NoEndpointFound);
        };
        debug!(
            exchange_id = %ctx.exchange_id(),
            endpoint_kind = chain.endpoint().kind(),
            interceptors = chain.interceptors().len(),
            "endpoint resolved"
        );

        if let Some(precheck) = &self.precheck {
            if precheck.handle_request(&chain, ctx).await? == ControlFlow::Stop {
                // No interceptor was entered, so there is nothing to
                // complete; the precheck's response is the result.
                return Ok(());
            }
        }

        let endpoint = chain.endpoint();
        let interceptors = chain.interceptors();

        // Request phase. `completed` counts interceptors whose
        // handle_request was entered, including one that stopped or failed.
        let mut completed = 0;
        let mut halted = false;
        let mut pending: Option<DispatchError> = None;
        for interceptor in interceptors {
            completed += 1;
            match interceptor.handle_request(ctx, endpoint).await {
                Ok(ControlFlow::Continue) => {}
                Ok(ControlFlow::Stop) => {
                    halted = true;
                    break;
                }
                Err(error) => {
                    pending = Some(DispatchError::Interceptor(error));
                    halted = true;
                    break;
                }
            }
        }

        // Invocation phase.
        if !halted {
            match self.adapter_for(endpoint) {
                Some(adapter) => {
                    if let Err(error) = adapter.invoke(ctx, endpoint).await {
                        if self.resolve_exception(ctx, Some(endpoint), &error).await {
                            debug!(exchange_id = %ctx.exchange_id(), "endpoint error resolved");
                        } else {
                            pending = Some(DispatchError::Endpoint(error));
                        }
                    }
                }
                None => {
                    pending = Some(DispatchError::NoAdapter {
                        endpoint_kind: endpoint.kind(),
                    });
                }
            }
        }

        // Response phase: reverse order over the entered prefix, only when
        // the invocation ran and produced a response.
        if !halted && pending.is_none() && ctx.has_response() {
            let faulted = ctx.response().is_some_and(WebServiceMessage::has_fault);
            for interceptor in interceptors[..completed].iter().rev() {
                let outcome = if faulted {
                    interceptor.handle_fault(ctx, endpoint).await
                } else {
                    interceptor.handle_response(ctx, endpoint).await
                };
                match outcome {
                    Ok(ControlFlow::Continue) => {}
                    Ok(ControlFlow::Stop) => break,
                    Err(error) => {
                        pending = Some(DispatchError::Interceptor(error));
                        break;
                    }
                }
            }
        }

        // Completion phase, unconditionally.
        for interceptor in interceptors[..completed].iter().rev() {
            if let Err(error) = interceptor
                .after_completion(ctx, endpoint, pending.as_ref())
                .await
            {
                warn!(
                    exchange_id = %ctx.exchange_id(),
                    error = %error,
                    "after_completion hook failed"
                );
            }
        }

        match pending {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn resolve_endpoint(
        &self,
        ctx: &MessageContext<M>,
    ) -> Result<Option<EndpointInvocationChain<M>>, DispatchError> {
        for mapping in &self.mappings {
            if let Some(chain) = mapping.endpoint(ctx).await.map_err(DispatchError::Mapping)? {
                return Ok(Some(chain));
            }
        }
        Ok(None)
    }

    fn adapter_for(&self, endpoint: &Endpoint<M>) -> Option<&dyn EndpointAdapter<M>> {
        self.adapters
            .iter()
            .map(AsRef::as_ref)
            .find(|adapter| adapter.supports(endpoint))
    }

    async fn resolve_exception(
        &self,
        ctx: &mut MessageContext<M>,
        endpoint: Option<&Endpoint<M>>,
        error: &anyhow::Error,
    ) -> bool {
        for resolver in &self.resolvers {
            if let Some(mapped) = resolver.mapped_endpoints() {
                let in_scope = endpoint
                    .is_some_and(|ep| mapped.iter().any(|candidate| candidate.same_endpoint(ep)));
                if !in_scope {
                    continue;
                }
            }
            if resolver.resolve_exception(ctx, endpoint, error).await {
                return true;
            }
        }
        false
    }
}

impl<M: WebServiceMessage> Default for MessageDispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: WebServiceMessage> MessageReceiver<M> for MessageDispatcher<M> {
    async fn receive(&self, ctx: &mut MessageContext<M>) -> Result<(), DispatchError> {
        if self.trace_payloads {
            log_payload(ctx.request(), "received request");
        }
        let result = self.dispatch(ctx).await;
        if let Some(response) = ctx.response() {
            if self.trace_payloads {
                log_payload(response, "sending response");
            }
        } else if result.is_ok() {
            trace!(exchange_id = %ctx.exchange_id(), "exchange completed without response");
        }
        result
    }
}

/// TRACE-log a message payload, but only when the subscriber cares and
/// the payload survives re-reading.
fn log_payload<M: WebServiceMessage>(message: &M, what: &str) {
    if tracing::enabled!(target: "soapgate::dispatcher", tracing::Level::TRACE) && message.is_caching() {
        if let Ok(payload) = message.payload() {
            trace!(
                target: "soapgate::dispatcher",
                payload = %String::from_utf8_lossy(&payload),
                "{what}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
