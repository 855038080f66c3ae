//! Transport boundary: the seam between a wire protocol and the
//! dispatcher. Transports implement [`WebServiceConnection`]; the
//! [`ConnectionReceiver`] drives one exchange per connection.

use std::sync::Arc;

use async_trait::async_trait;
use soapgate_core::{MessageFactory, WebServiceMessage};
use thiserror::Error;
use tracing::{debug, trace};

use crate::context::MessageContext;
use crate::dispatcher::{DispatchError, MessageReceiver};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure at the wire level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to receive message: {0}")]
    Receive(String),
    #[error("failed to send message: {0}")]
    Send(String),
    #[error("connection closed")]
    Closed,
}

/// Failure of a connection-driven exchange.
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

// ---------------------------------------------------------------------------
// WebServiceConnection
// ---------------------------------------------------------------------------

/// One request/response exchange with a remote party, as seen by the
/// dispatch layer. Implementations own the wire details.
#[async_trait]
pub trait WebServiceConnection<M: WebServiceMessage>: Send {
    /// Read the request message. `Ok(None)` means the peer sent nothing
    /// to dispatch (e.g. an empty poll).
    async fn receive(&mut self) -> Result<Option<M>, TransportError>;

    /// Write the response message.
    async fn send(&mut self, response: &M) -> Result<(), TransportError>;

    /// React to a request no endpoint claimed. The default does nothing;
    /// an HTTP binding would set a 404 status here.
    async fn on_no_endpoint(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ConnectionReceiver
// ---------------------------------------------------------------------------

/// Pulls a request off a connection, dispatches it, and writes back the
/// response if one was produced.
pub struct ConnectionReceiver<M: WebServiceMessage> {
    receiver: Arc<dyn MessageReceiver<M>>,
    factory: Arc<dyn MessageFactory<M>>,
}

impl<M: WebServiceMessage> ConnectionReceiver<M> {
    pub fn new(receiver: Arc<dyn MessageReceiver<M>>, factory: Arc<dyn MessageFactory<M>>) -> Self {
        Self { receiver, factory }
    }

    /// Run one exchange over `connection`.
    ///
    /// An unmatched request is not an error at this level: the connection
    /// is told via `on_no_endpoint` and the exchange ends quietly.
    pub async fn handle<C>(&self, connection: &mut C) -> Result<(), ReceiverError>
    where
        C: WebServiceConnection<M>,
    {
        let Some(request) = connection.receive().await? else {
            trace!("connection yielded no request");
            return Ok(());
        };

        let mut ctx = MessageContext::new(request, Arc::clone(&self.factory));
        match self.receiver.receive(&mut ctx).await {
            Ok(()) => {}
            Err(DispatchError::NoEndpointFound) => {
                debug!(exchange_id = %ctx.exchange_id(), "request matched no endpoint");
                connection.on_no_endpoint().await?;
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        }

        if let Some(response) = ctx.response() {
            connection.send(response).await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
