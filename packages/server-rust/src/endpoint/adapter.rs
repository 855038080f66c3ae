//! Endpoint adapters: polymorphic invokers that know how to call one shape
//! of endpoint.

use async_trait::async_trait;
use soapgate_core::WebServiceMessage;
use tracing::trace;

use crate::context::MessageContext;

use super::Endpoint;

// ---------------------------------------------------------------------------
// EndpointAdapter trait
// ---------------------------------------------------------------------------

/// Strategy for invoking a specific shape of endpoint.
///
/// The dispatcher tries every registered adapter's [`supports`](Self::supports)
/// per exchange and invokes through the first that matches, so `supports`
/// must be cheap. Errors from `invoke` flow into exception resolution.
#[async_trait]
pub trait EndpointAdapter<M: WebServiceMessage>: Send + Sync {
    /// Whether this adapter can invoke the given endpoint.
    fn supports(&self, endpoint: &Endpoint<M>) -> bool;

    /// Invoke the endpoint for the current exchange.
    async fn invoke(&self, ctx: &mut MessageContext<M>, endpoint: &Endpoint<M>)
        -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// MessageEndpointAdapter
// ---------------------------------------------------------------------------

/// Invokes [`Endpoint::Message`] endpoints by handing them the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageEndpointAdapter;

#[async_trait]
impl<M: WebServiceMessage> EndpointAdapter<M> for MessageEndpointAdapter {
    fn supports(&self, endpoint: &Endpoint<M>) -> bool {
        matches!(endpoint, Endpoint::Message(_))
    }

    async fn invoke(
        &self,
        ctx: &mut MessageContext<M>,
        endpoint: &Endpoint<M>,
    ) -> anyhow::Result<()> {
        let Endpoint::Message(endpoint) = endpoint else {
            anyhow::bail!("MessageEndpointAdapter cannot invoke a {} endpoint", endpoint.kind());
        };
        endpoint.invoke(ctx).await
    }
}

// ---------------------------------------------------------------------------
// PayloadEndpointAdapter
// ---------------------------------------------------------------------------

/// Invokes [`Endpoint::Payload`] endpoints: reads the request payload,
/// hands it to the endpoint, and writes a returned payload into the
/// response. No returned payload means no response is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEndpointAdapter;

#[async_trait]
impl<M: WebServiceMessage> EndpointAdapter<M> for PayloadEndpointAdapter {
    fn supports(&self, endpoint: &Endpoint<M>) -> bool {
        matches!(endpoint, Endpoint::Payload(_))
    }

    async fn invoke(
        &self,
        ctx: &mut MessageContext<M>,
        endpoint: &Endpoint<M>,
    ) -> anyhow::Result<()> {
        let Endpoint::Payload(endpoint) = endpoint else {
            anyhow::bail!("PayloadEndpointAdapter cannot invoke a {} endpoint", endpoint.kind());
        };
        let request_payload = ctx.request().payload()?;
        match endpoint.invoke(request_payload).await? {
            Some(response_payload) => {
                ctx.create_response()?.set_payload(response_payload);
            }
            None => {
                trace!(exchange_id = %ctx.exchange_id(), "payload endpoint produced no response");
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
