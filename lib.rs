/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Custom-scheme protocol registrar for embedding shells.
//!
//! Embedders declare privileged scheme capabilities before their network
//! stack starts, register or intercept scheme handlers per browsing context
//! at any time after, and hand the network stack a per-context loader-factory
//! map that reflects the registry state at context creation.

pub mod embedder;
pub mod protocols;
pub mod registries;
pub mod runtime;

pub use embedder::ProtocolService;
pub use protocols::{
    ContentStream, HttpForward, ProtocolHandler, ProtocolRequest, ProtocolResponse, ProtocolType,
    ResponseSink, TransportError,
};
pub use registries::atomic::privilege::{
    CustomScheme, CustomSchemeSet, PrivilegeError, PrivilegeRegistry, SchemePrivilege,
    is_standard_scheme, privilege_table, register_schemes_as_privileged, standard_schemes,
};
pub use registries::atomic::protocol::{
    HandlersMap, ProtocolEntry, ProtocolError, ProtocolRegistry,
};
pub use registries::atomic::protocol_provider::{ProtocolHandlerProvider, ProtocolHandlerProviders};
pub use registries::domain::loader::{
    BuiltinFactories, FactoryMap, LoaderClient, LoaderContext, ResourceBody, ResourceResponse,
    SchemeLoaderFactory, register_url_loader_factories,
};
pub use runtime::diagnostics::{DiagnosticEvent, install_global_sender};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
