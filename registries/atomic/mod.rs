pub mod privilege;
pub mod protocol;
pub mod protocol_provider;

pub use protocol_provider::ProtocolHandlerProviders;
