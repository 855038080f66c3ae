//! SoapGate Server — SOAP message dispatch: endpoint resolution,
//! interceptor chains, adapters, and must-understand header processing.

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod endpoint;
pub mod soap;
pub mod transport;

pub use config::DispatcherConfig;
pub use context::MessageContext;
pub use dispatcher::{
    ChainPrecheck, DispatchError, MessageDispatcher, MessageReceiver,
    ENDPOINT_NOT_FOUND_LOG_TARGET,
};
pub use endpoint::{
    ControlFlow, Endpoint, EndpointAdapter, EndpointExceptionResolver, EndpointInterceptor,
    EndpointInvocationChain, EndpointMapping, MessageEndpoint, MessageEndpointAdapter,
    ObservationInterceptor, PayloadEndpoint, PayloadEndpointAdapter, PayloadLoggingInterceptor,
    PayloadRootMapping, SimpleSoapFaultResolver, SoapActionMapping, SoapEndpointInterceptor,
};
pub use soap::{MustUnderstandCheck, SoapMessageDispatcher};
pub use transport::{ConnectionReceiver, ReceiverError, TransportError, WebServiceConnection};
