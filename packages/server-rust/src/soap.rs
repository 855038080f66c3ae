//! SOAP-specific dispatch: must-understand header processing layered on
//! the protocol-agnostic dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use soapgate_core::{QName, SoapFault, SoapHeaderElement, SoapMessage, SoapVersion};
use tracing::{debug, warn};

use crate::config::DispatcherConfig;
use crate::context::MessageContext;
use crate::dispatcher::{ChainPrecheck, DispatchError, MessageDispatcher, MessageReceiver};
use crate::endpoint::{
    ControlFlow, EndpointAdapter, EndpointExceptionResolver, EndpointInterceptor,
    EndpointInvocationChain, EndpointMapping,
};

// ---------------------------------------------------------------------------
// Header scoping and understanding
// ---------------------------------------------------------------------------

/// Whether a header is addressed to this node, given the actor/role URIs
/// the resolved chain declares and whether the node acts as the ultimate
/// receiver.
#[must_use]
pub fn header_in_scope(
    header: &SoapHeaderElement,
    version: SoapVersion,
    actors_or_roles: &[String],
    ultimate_receiver: bool,
) -> bool {
    match (&header.actor_or_role, version) {
        // No attribute: SOAP 1.1 targets every node; SOAP 1.2 defaults to
        // the ultimate receiver role.
        (None, SoapVersion::Soap11) => true,
        (None, SoapVersion::Soap12) => ultimate_receiver,
        (Some(uri), version) => {
            if uri == version.next_actor_or_role_uri() {
                return true;
            }
            if version == SoapVersion::Soap12 {
                if uri == version.none_actor_or_role_uri() {
                    return false;
                }
                if uri == version.ultimate_receiver_role_uri() {
                    return ultimate_receiver;
                }
            }
            actors_or_roles.iter().any(|declared| declared == uri)
        }
    }
}

/// Whether any SOAP-aware interceptor in the chain claims the header.
#[must_use]
pub fn understood<M: SoapMessage>(
    interceptors: &[Arc<dyn EndpointInterceptor<M>>],
    header: &SoapHeaderElement,
) -> bool {
    interceptors
        .iter()
        .any(|interceptor| interceptor.as_soap().is_some_and(|soap| soap.understands(header)))
}

// ---------------------------------------------------------------------------
// MustUnderstandCheck
// ---------------------------------------------------------------------------

/// Pre-interceptor check enforcing the SOAP `mustUnderstand` contract.
///
/// Every mandatory header addressed to this node must be claimed by a
/// SOAP-aware interceptor in the resolved chain. Otherwise the exchange is
/// answered with a MustUnderstand fault and the endpoint never runs.
pub struct MustUnderstandCheck {
    fault_string: String,
    fault_locale: String,
}

impl MustUnderstandCheck {
    #[must_use]
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            fault_string: config.must_understand_fault_string.clone(),
            fault_locale: config.must_understand_fault_locale.clone(),
        }
    }

    fn not_understood<M: SoapMessage>(
        &self,
        chain: &EndpointInvocationChain<M>,
        ctx: &MessageContext<M>,
    ) -> Vec<QName> {
        let version = ctx.request().version();
        ctx.request()
            .header_elements()
            .iter()
            .filter(|header| {
                header.must_understand
                    && header_in_scope(
                        header,
                        version,
                        chain.actors_or_roles(),
                        chain.is_ultimate_receiver(),
                    )
                    && !understood(chain.interceptors(), header)
            })
            .map(|header| header.name.clone())
            .collect()
    }
}

impl Default for MustUnderstandCheck {
    fn default() -> Self {
        Self::new(&DispatcherConfig::default())
    }
}

#[async_trait]
impl<M: SoapMessage> ChainPrecheck<M> for MustUnderstandCheck {
    async fn handle_request(
        &self,
        chain: &EndpointInvocationChain<M>,
        ctx: &mut MessageContext<M>,
    ) -> Result<ControlFlow, DispatchError> {
        let names = self.not_understood(chain, ctx);
        if names.is_empty() {
            return Ok(ControlFlow::Continue);
        }
        warn!(
            exchange_id = %ctx.exchange_id(),
            headers = %names.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            "mandatory headers not understood"
        );

        let version = ctx.request().version();
        let mut fault = SoapFault::must_understand(version)
            .with_locale(self.fault_locale.clone());
        fault.reason = self.fault_string.clone();
        // The fault is attributed to the first role this node acts in,
        // when the chain declares any.
        if let Some(actor) = chain.actors_or_roles().first() {
            fault = fault.with_role(actor.clone());
        }

        let response = ctx.create_response()?;
        response.set_fault(fault);
        if version == SoapVersion::Soap12 {
            for name in &names {
                response.add_header_element(SoapHeaderElement::not_understood(name));
            }
        }
        Ok(ControlFlow::Stop)
    }
}

// ---------------------------------------------------------------------------
// SoapMessageDispatcher
// ---------------------------------------------------------------------------

/// A [`MessageDispatcher`] with the must-understand check installed.
pub struct SoapMessageDispatcher<M: SoapMessage> {
    inner: MessageDispatcher<M>,
}

impl<M: SoapMessage> SoapMessageDispatcher<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&DispatcherConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &DispatcherConfig) -> Self {
        let mut inner = MessageDispatcher::new();
        inner.set_precheck(Arc::new(MustUnderstandCheck::new(config)));
        inner.set_trace_payloads(config.trace_payloads);
        debug!("soap dispatcher configured with must-understand check");
        Self { inner }
    }

    pub fn add_mapping(&mut self, mapping: Arc<dyn EndpointMapping<M>>) {
        self.inner.add_mapping(mapping);
    }

    pub fn add_adapter(&mut self, adapter: Arc<dyn EndpointAdapter<M>>) {
        self.inner.add_adapter(adapter);
    }

    pub fn add_resolver(&mut self, resolver: Arc<dyn EndpointExceptionResolver<M>>) {
        self.inner.add_resolver(resolver);
    }

    /// Run one exchange to completion.
    pub async fn dispatch(&self, ctx: &mut MessageContext<M>) -> Result<(), DispatchError> {
        self.inner.dispatch(ctx).await
    }
}

impl<M: SoapMessage> Default for SoapMessageDispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: SoapMessage> MessageReceiver<M> for SoapMessageDispatcher<M> {
    async fn receive(&self, ctx: &mut MessageContext<M>) -> Result<(), DispatchError> {
        self.inner.receive(ctx).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use soapgate_core::{
        InMemoryMessage, InMemoryMessageFactory, WebServiceMessage, MUST_UNDERSTAND_FAULT_STRING,
        SOAP_12_NAMESPACE_URI,
    };

    use crate::endpoint::{Endpoint, PayloadEndpoint, PayloadEndpointAdapter, SoapEndpointInterceptor};

    use super::*;

    struct Echo;

    #[async_trait]
    impl PayloadEndpoint for Echo {
        async fn invoke(&self, payload: Bytes) -> anyhow::Result<Option<Bytes>> {
            Ok(Some(payload))
        }
    }

    /// Interceptor claiming understanding of one header name.
    struct Understands(QName);

    #[async_trait]
    impl EndpointInterceptor<InMemoryMessage> for Understands {
        fn as_soap(&self) -> Option<&dyn SoapEndpointInterceptor<InMemoryMessage>> {
            Some(self)
        }
    }

    impl SoapEndpointInterceptor<InMemoryMessage> for Understands {
        fn understands(&self, header: &SoapHeaderElement) -> bool {
            header.name == self.0
        }
    }

    struct FixedMapping {
        chain: EndpointInvocationChain<InMemoryMessage>,
    }

    #[async_trait]
    impl EndpointMapping<InMemoryMessage> for FixedMapping {
        async fn endpoint(
            &self,
            _ctx: &MessageContext<InMemoryMessage>,
        ) -> anyhow::Result<Option<EndpointInvocationChain<InMemoryMessage>>> {
            Ok(Some(self.chain.clone()))
        }
    }

    fn security_header() -> QName {
        QName::new("urn:sec", "Security")
    }

    fn make_context(message: InMemoryMessage) -> MessageContext<InMemoryMessage> {
        let version = message.version();
        MessageContext::new(message, Arc::new(InMemoryMessageFactory::new(version)))
    }

    fn dispatcher_for(
        chain: EndpointInvocationChain<InMemoryMessage>,
    ) -> SoapMessageDispatcher<InMemoryMessage> {
        let mut dispatcher = SoapMessageDispatcher::new();
        dispatcher.add_mapping(Arc::new(FixedMapping { chain }));
        dispatcher.add_adapter(Arc::new(PayloadEndpointAdapter));
        dispatcher
    }

    fn mandatory(version: SoapVersion) -> InMemoryMessage {
        InMemoryMessage::new(version)
            .with_payload("<order/>")
            .with_header(SoapHeaderElement::new(security_header()).must_understand())
    }

    // --- scope rules -----------------------------------------------------

    #[test]
    fn untargeted_header_scope_depends_on_version_and_receiver_flag() {
        let header = SoapHeaderElement::new(security_header()).must_understand();

        assert!(header_in_scope(&header, SoapVersion::Soap11, &[], false));
        assert!(header_in_scope(&header, SoapVersion::Soap12, &[], true));
        assert!(!header_in_scope(&header, SoapVersion::Soap12, &[], false));
    }

    #[test]
    fn next_role_is_always_in_scope() {
        for version in [SoapVersion::Soap11, SoapVersion::Soap12] {
            let header = SoapHeaderElement::new(security_header())
                .for_actor_or_role(version.next_actor_or_role_uri());
            assert!(header_in_scope(&header, version, &[], false));
        }
    }

    #[test]
    fn soap12_none_role_is_never_in_scope() {
        let header = SoapHeaderElement::new(security_header())
            .for_actor_or_role(SoapVersion::Soap12.none_actor_or_role_uri());
        assert!(!header_in_scope(&header, SoapVersion::Soap12, &[], true));
    }

    #[test]
    fn declared_actor_brings_header_into_scope() {
        let header =
            SoapHeaderElement::new(security_header()).for_actor_or_role("urn:gateway");
        let declared = vec!["urn:gateway".to_string()];

        assert!(header_in_scope(&header, SoapVersion::Soap11, &declared, true));
        assert!(!header_in_scope(&header, SoapVersion::Soap11, &[], true));
    }

    // --- dispatch behavior -----------------------------------------------

    #[tokio::test]
    async fn understood_mandatory_header_reaches_the_endpoint() {
        let chain = EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo))
            .with_interceptor(Arc::new(Understands(security_header())));
        let dispatcher = dispatcher_for(chain);

        let mut ctx = make_context(mandatory(SoapVersion::Soap11));
        dispatcher.dispatch(&mut ctx).await.unwrap();

        assert!(!ctx.response().unwrap().has_fault());
    }

    #[tokio::test]
    async fn soap11_unclaimed_mandatory_header_faults() {
        let chain = EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo));
        let dispatcher = dispatcher_for(chain);

        let message = InMemoryMessage::new(SoapVersion::Soap11)
            .with_payload("<order/>")
            .with_header(
                SoapHeaderElement::new(security_header())
                    .must_understand()
                    .for_actor_or_role(SoapVersion::Soap11.next_actor_or_role_uri()),
            );
        let mut ctx = make_context(message);
        dispatcher.dispatch(&mut ctx).await.unwrap();

        let response = ctx.response().unwrap();
        let fault = response.fault().unwrap();
        assert_eq!(fault.code, SoapVersion::Soap11.must_understand_fault_name());
        assert_eq!(fault.reason, MUST_UNDERSTAND_FAULT_STRING);
        assert_eq!(fault.reason_locale, "en");
        assert!(response.header_elements().is_empty());
    }

    #[tokio::test]
    async fn soap12_fault_carries_not_understood_headers() {
        let chain = EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo));
        let dispatcher = dispatcher_for(chain);

        let mut ctx = make_context(mandatory(SoapVersion::Soap12));
        dispatcher.dispatch(&mut ctx).await.unwrap();

        let response = ctx.response().unwrap();
        let fault = response.fault().unwrap();
        assert_eq!(fault.code, SoapVersion::Soap12.must_understand_fault_name());

        let headers = response.header_elements();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name.namespace_uri(), SOAP_12_NAMESPACE_URI);
        assert_eq!(headers[0].name.local_part(), "NotUnderstood");
        assert_eq!(headers[0].text, "{urn:sec}Security");
    }

    #[tokio::test]
    async fn header_for_another_actor_is_ignored() {
        let chain = EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo));
        let dispatcher = dispatcher_for(chain);

        let message = InMemoryMessage::new(SoapVersion::Soap11)
            .with_payload("<order/>")
            .with_header(
                SoapHeaderElement::new(security_header())
                    .must_understand()
                    .for_actor_or_role("urn:somebody-else"),
            );
        let mut ctx = make_context(message);
        dispatcher.dispatch(&mut ctx).await.unwrap();

        assert!(!ctx.response().unwrap().has_fault());
    }

    #[tokio::test]
    async fn fault_role_comes_from_first_declared_actor() {
        let chain = EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo))
            .with_actors_or_roles(vec!["urn:gateway".to_string(), "urn:other".to_string()]);
        let dispatcher = dispatcher_for(chain);

        let message = InMemoryMessage::new(SoapVersion::Soap11)
            .with_payload("<order/>")
            .with_header(
                SoapHeaderElement::new(security_header())
                    .must_understand()
                    .for_actor_or_role("urn:gateway"),
            );
        let mut ctx = make_context(message);
        dispatcher.dispatch(&mut ctx).await.unwrap();

        let fault = ctx.response().unwrap().fault().unwrap();
        assert_eq!(fault.role.as_deref(), Some("urn:gateway"));
    }

    #[tokio::test]
    async fn non_ultimate_receiver_skips_soap12_default_scoped_headers() {
        let chain = EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo))
            .with_ultimate_receiver(false);
        let dispatcher = dispatcher_for(chain);

        let mut ctx = make_context(mandatory(SoapVersion::Soap12));
        dispatcher.dispatch(&mut ctx).await.unwrap();

        assert!(!ctx.response().unwrap().has_fault());
    }

    #[tokio::test]
    async fn configured_fault_text_overrides_default() {
        let config = DispatcherConfig {
            must_understand_fault_string: "Kop niet begrepen".to_string(),
            must_understand_fault_locale: "nl".to_string(),
            ..DispatcherConfig::default()
        };
        let mut dispatcher = SoapMessageDispatcher::with_config(&config);
        dispatcher.add_mapping(Arc::new(FixedMapping {
            chain: EndpointInvocationChain::new(Endpoint::from_payload_endpoint(Echo)),
        }));
        dispatcher.add_adapter(Arc::new(PayloadEndpointAdapter));

        let mut ctx = make_context(mandatory(SoapVersion::Soap11));
        dispatcher.dispatch(&mut ctx).await.unwrap();

        let fault = ctx.response().unwrap().fault().unwrap();
        assert_eq!(fault.reason, "Kop niet begrepen");
        assert_eq!(fault.reason_locale, "nl");
    }
}
