//! Endpoint mappings: strategies resolving a message to an endpoint and
//! its interceptor chain.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use soapgate_core::{
    QName, SoapMessage, WebServiceMessage, SOAP_11_NAMESPACE_URI, SOAP_12_NAMESPACE_URI,
};
use tracing::debug;

use crate::context::MessageContext;

use super::chain::EndpointInvocationChain;
use super::interceptor::EndpointInterceptor;
use super::Endpoint;

// ---------------------------------------------------------------------------
// EndpointMapping trait
// ---------------------------------------------------------------------------

/// Strategy resolving a message to an endpoint invocation chain.
///
/// `Ok(None)` means "no match for this request" and makes the dispatcher
/// consult the next mapping; `Err` means resolution itself failed and
/// aborts the exchange.
#[async_trait]
pub trait EndpointMapping<M: WebServiceMessage>: Send + Sync {
    /// Resolve the chain for this exchange, if this mapping matches.
    async fn endpoint(
        &self,
        ctx: &MessageContext<M>,
    ) -> anyhow::Result<Option<EndpointInvocationChain<M>>>;
}

// ---------------------------------------------------------------------------
// Chain defaults shared by the keyed mappings
// ---------------------------------------------------------------------------

struct ChainDefaults<M: WebServiceMessage> {
    interceptors: Vec<Arc<dyn EndpointInterceptor<M>>>,
    actors_or_roles: Vec<String>,
    ultimate_receiver: bool,
}

impl<M: WebServiceMessage> Default for ChainDefaults<M> {
    fn default() -> Self {
        Self {
            interceptors: Vec::new(),
            actors_or_roles: Vec::new(),
            ultimate_receiver: true,
        }
    }
}

impl<M: WebServiceMessage> ChainDefaults<M> {
    fn chain_for(&self, endpoint: Endpoint<M>) -> EndpointInvocationChain<M> {
        EndpointInvocationChain::new(endpoint)
            .with_interceptors(self.interceptors.clone())
            .with_actors_or_roles(self.actors_or_roles.clone())
            .with_ultimate_receiver(self.ultimate_receiver)
    }
}

// ---------------------------------------------------------------------------
// PayloadRootMapping
// ---------------------------------------------------------------------------

/// Maps the qualified name of the payload root element to an endpoint.
///
/// Works on any message whose payload region is readable; the configured
/// interceptors and actor/role set apply to every chain this mapping
/// returns.
pub struct PayloadRootMapping<M: WebServiceMessage> {
    endpoints: HashMap<QName, Endpoint<M>>,
    defaults: ChainDefaults<M>,
}

impl<M: WebServiceMessage> PayloadRootMapping<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
            defaults: ChainDefaults::default(),
        }
    }

    /// Register an endpoint for a payload root name. Last registration for
    /// a name wins.
    pub fn register(&mut self, root: QName, endpoint: Endpoint<M>) {
        self.endpoints.insert(root, endpoint);
    }

    /// Interceptors applied to every chain this mapping returns, in order.
    pub fn set_interceptors(&mut self, interceptors: Vec<Arc<dyn EndpointInterceptor<M>>>) {
        self.defaults.interceptors = interceptors;
    }

    /// Actor/role URIs declared on every chain this mapping returns.
    pub fn set_actors_or_roles(&mut self, actors_or_roles: Vec<String>) {
        self.defaults.actors_or_roles = actors_or_roles;
    }

    /// Whether chains from this mapping describe the ultimate receiver.
    pub fn set_ultimate_receiver(&mut self, ultimate_receiver: bool) {
        self.defaults.ultimate_receiver = ultimate_receiver;
    }
}

impl<M: WebServiceMessage> Default for PayloadRootMapping<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: WebServiceMessage> EndpointMapping<M> for PayloadRootMapping<M> {
    async fn endpoint(
        &self,
        ctx: &MessageContext<M>,
    ) -> anyhow::Result<Option<EndpointInvocationChain<M>>> {
        let payload = ctx
            .request()
            .payload()
            .context("reading payload for root-element resolution")?;
        let Some(root) = extract_payload_root(&payload) else {
            return Ok(None);
        };
        match self.endpoints.get(&root) {
            Some(endpoint) => {
                debug!(root = %root, endpoint_kind = endpoint.kind(), "payload root mapped to endpoint");
                Ok(Some(self.defaults.chain_for(endpoint.clone())))
            }
            None => {
                debug!(root = %root, "no endpoint registered for payload root");
                Ok(None)
            }
        }
    }
}

/// Qualified name of the payload root element.
///
/// Parsed with a namespace-resolving `quick-xml` reader (safe against XXE:
/// entities are not expanded), so inherited declarations resolve correctly.
/// When the payload arrives wrapped in a SOAP envelope, the root is the
/// first element inside `Body`; the `Header` subtree is skipped. Returns
/// `None` when the root cannot be determined (malformed XML, unbound
/// prefix, empty input).
#[must_use]
pub fn extract_payload_root(payload: &[u8]) -> Option<QName> {
    let text = std::str::from_utf8(payload).ok()?;
    let mut reader = NsReader::from_str(text);

    loop {
        let (resolve, event) = reader.read_resolved_event().ok()?;
        let (start, has_children) = match &event {
            Event::Start(start) => (start, true),
            Event::Empty(start) => (start, false),
            Event::Eof => return None,
            _ => continue,
        };

        let local = std::str::from_utf8(start.local_name().as_ref())
            .ok()?
            .to_string();
        let namespace = match resolve {
            ResolveResult::Bound(ns) => Some(std::str::from_utf8(ns.as_ref()).ok()?.to_string()),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(_) => return None,
        };

        if let Some(ns) = namespace.as_deref() {
            if ns == SOAP_11_NAMESPACE_URI || ns == SOAP_12_NAMESPACE_URI {
                match local.as_str() {
                    // Envelope structure around the payload: descend.
                    "Envelope" | "Body" => continue,
                    "Header" if has_children => {
                        let end = start.to_end().into_owned();
                        reader.read_to_end(end.name()).ok()?;
                        continue;
                    }
                    "Header" => continue,
                    _ => {}
                }
            }
        }

        let prefix = start
            .name()
            .prefix()
            .and_then(|prefix| std::str::from_utf8(prefix.as_ref()).ok().map(str::to_string));
        return Some(match (namespace, prefix) {
            (Some(namespace), Some(prefix)) => QName::new(namespace, local).with_prefix(prefix),
            (Some(namespace), None) => QName::new(namespace, local),
            (None, _) => QName::local(local),
        });
    }
}

// ---------------------------------------------------------------------------
// SoapActionMapping
// ---------------------------------------------------------------------------

/// Maps the SOAP action to an endpoint.
///
/// Action values arrive quoted on the wire for SOAP 1.1
/// (`SOAPAction: "urn:orders"`); surrounding double quotes are stripped
/// before lookup.
pub struct SoapActionMapping<M: SoapMessage> {
    endpoints: HashMap<String, Endpoint<M>>,
    defaults: ChainDefaults<M>,
}

impl<M: SoapMessage> SoapActionMapping<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
            defaults: ChainDefaults::default(),
        }
    }

    /// Register an endpoint for a SOAP action. Last registration wins.
    pub fn register(&mut self, action: impl Into<String>, endpoint: Endpoint<M>) {
        self.endpoints.insert(action.into(), endpoint);
    }

    /// Interceptors applied to every chain this mapping returns, in order.
    pub fn set_interceptors(&mut self, interceptors: Vec<Arc<dyn EndpointInterceptor<M>>>) {
        self.defaults.interceptors = interceptors;
    }

    /// Actor/role URIs declared on every chain this mapping returns.
    pub fn set_actors_or_roles(&mut self, actors_or_roles: Vec<String>) {
        self.defaults.actors_or_roles = actors_or_roles;
    }

    /// Whether chains from this mapping describe the ultimate receiver.
    pub fn set_ultimate_receiver(&mut self, ultimate_receiver: bool) {
        self.defaults.ultimate_receiver = ultimate_receiver;
    }
}

impl<M: SoapMessage> Default for SoapActionMapping<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: SoapMessage> EndpointMapping<M> for SoapActionMapping<M> {
    async fn endpoint(
        &self,
        ctx: &MessageContext<M>,
    ) -> anyhow::Result<Option<EndpointInvocationChain<M>>> {
        let action = unquote(ctx.request().soap_action().unwrap_or(""));
        match self.endpoints.get(action) {
            Some(endpoint) => {
                debug!(action, endpoint_kind = endpoint.kind(), "soap action mapped to endpoint");
                Ok(Some(self.defaults.chain_for(endpoint.clone())))
            }
            None => Ok(None),
        }
    }
}

fn unquote(action: &str) -> &str {
    action
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(action)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
