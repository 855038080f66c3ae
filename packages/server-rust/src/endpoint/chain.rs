//! Endpoint invocation chain: the pairing of a resolved endpoint with its
//! ordered interceptors and SOAP routing attributes.

use std::sync::Arc;

use soapgate_core::WebServiceMessage;

use super::interceptor::EndpointInterceptor;
use super::Endpoint;

/// One endpoint plus the interceptors wrapping its invocation, as returned
/// by an [`EndpointMapping`](super::EndpointMapping).
///
/// The actor/role set and the ultimate-receiver flag drive SOAP
/// must-understand processing: they declare which header targets this node
/// fulfills. The defaults (no actors, ultimate receiver) describe a plain
/// endpoint at the end of the message path.
pub struct EndpointInvocationChain<M: WebServiceMessage> {
    endpoint: Endpoint<M>,
    interceptors: Vec<Arc<dyn EndpointInterceptor<M>>>,
    actors_or_roles: Vec<String>,
    ultimate_receiver: bool,
}

impl<M: WebServiceMessage> EndpointInvocationChain<M> {
    /// Chain with no interceptors.
    #[must_use]
    pub fn new(endpoint: Endpoint<M>) -> Self {
        Self {
            endpoint,
            interceptors: Vec::new(),
            actors_or_roles: Vec::new(),
            ultimate_receiver: true,
        }
    }

    /// Replace the interceptor list.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn EndpointInterceptor<M>>>) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Append one interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn EndpointInterceptor<M>>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Declare the actor/role URIs this endpoint acts in.
    #[must_use]
    pub fn with_actors_or_roles(mut self, actors_or_roles: Vec<String>) -> Self {
        self.actors_or_roles = actors_or_roles;
        self
    }

    /// Set whether this endpoint is the ultimate receiver of the message
    /// path (as opposed to an intermediary).
    #[must_use]
    pub fn with_ultimate_receiver(mut self, ultimate_receiver: bool) -> Self {
        self.ultimate_receiver = ultimate_receiver;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint<M> {
        &self.endpoint
    }

    #[must_use]
    pub fn interceptors(&self) -> &[Arc<dyn EndpointInterceptor<M>>] {
        &self.interceptors
    }

    #[must_use]
    pub fn actors_or_roles(&self) -> &[String] {
        &self.actors_or_roles
    }

    #[must_use]
    pub fn is_ultimate_receiver(&self) -> bool {
        self.ultimate_receiver
    }
}

impl<M: WebServiceMessage> Clone for EndpointInvocationChain<M> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            interceptors: self.interceptors.clone(),
            actors_or_roles: self.actors_or_roles.clone(),
            ultimate_receiver: self.ultimate_receiver,
        }
    }
}
