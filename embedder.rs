/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Embedder-facing protocol service.
//!
//! One `ProtocolService` exists per browsing context. It serializes access to
//! the context's handler registry behind a single lock and exposes the
//! registration, interception, and loader-factory entry points the embedding
//! and network layers call.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::protocols::{ProtocolRequest, ProtocolType, ResponseSink};
use crate::registries::atomic::privilege;
use crate::registries::atomic::protocol::{ProtocolError, ProtocolRegistry};
use crate::registries::domain::loader::{
    BuiltinFactories, FactoryMap, LoaderContext, register_url_loader_factories,
};
use crate::registries::{
    CHANNEL_LOADER_FACTORIES_BUILT, CHANNEL_PROTOCOL_INTERCEPT_REJECTED,
    CHANNEL_PROTOCOL_INTERCEPT_SUCCEEDED, CHANNEL_PROTOCOL_REGISTER_REJECTED,
    CHANNEL_PROTOCOL_REGISTER_SUCCEEDED, CHANNEL_PROTOCOL_UNINTERCEPT_REJECTED,
    CHANNEL_PROTOCOL_UNINTERCEPT_SUCCEEDED, CHANNEL_PROTOCOL_UNREGISTER_REJECTED,
    CHANNEL_PROTOCOL_UNREGISTER_SUCCEEDED,
};
use crate::runtime::diagnostics::{DiagnosticEvent, emit_event};

/// Per-browsing-context handle over the scheme handler registry.
///
/// Cloning shares the underlying registry. Every mutation takes the write
/// lock for the duration of the map update only; loader-factory construction
/// snapshots handler entries under the read lock and never holds the lock
/// across a handler invocation.
#[derive(Clone)]
pub struct ProtocolService {
    registry: Arc<RwLock<ProtocolRegistry>>,
    builtins: Arc<BuiltinFactories>,
}

impl ProtocolService {
    pub fn new() -> Self {
        Self::with_builtins(BuiltinFactories::default())
    }

    pub fn with_builtins(builtins: BuiltinFactories) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ProtocolRegistry::new())),
            builtins: Arc::new(builtins),
        }
    }

    pub fn register_protocol<H>(
        &self,
        kind: ProtocolType,
        scheme: &str,
        handler: H,
    ) -> Result<(), ProtocolError>
    where
        H: Fn(ProtocolRequest, ResponseSink) + Send + Sync + 'static,
    {
        let result = self
            .registry
            .write()
            .register(kind, scheme, Arc::new(handler));
        match &result {
            Ok(()) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_REGISTER_SUCCEEDED,
                    latency_us: 1,
                });
                log::debug!("protocol '{scheme}' registered as {kind:?}");
            }
            Err(error) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_REGISTER_REJECTED,
                    latency_us: 1,
                });
                log::warn!("protocol '{scheme}' registration rejected: {error}");
            }
        }
        result
    }

    pub fn unregister_protocol(&self, scheme: &str) -> Result<(), ProtocolError> {
        let result = self.registry.write().unregister(scheme);
        match &result {
            Ok(()) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_UNREGISTER_SUCCEEDED,
                    latency_us: 1,
                });
                log::debug!("protocol '{scheme}' unregistered");
            }
            Err(error) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_UNREGISTER_REJECTED,
                    latency_us: 1,
                });
                log::warn!("protocol '{scheme}' unregistration rejected: {error}");
            }
        }
        result
    }

    pub fn is_protocol_registered(&self, scheme: &str) -> bool {
        self.registry.read().is_registered(scheme)
    }

    pub fn intercept_protocol<H>(
        &self,
        kind: ProtocolType,
        scheme: &str,
        handler: H,
    ) -> Result<(), ProtocolError>
    where
        H: Fn(ProtocolRequest, ResponseSink) + Send + Sync + 'static,
    {
        let result = self
            .registry
            .write()
            .intercept(kind, scheme, Arc::new(handler));
        match &result {
            Ok(()) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_INTERCEPT_SUCCEEDED,
                    latency_us: 1,
                });
                log::debug!("protocol '{scheme}' intercepted as {kind:?}");
            }
            Err(error) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_INTERCEPT_REJECTED,
                    latency_us: 1,
                });
                log::warn!("protocol '{scheme}' interception rejected: {error}");
            }
        }
        result
    }

    pub fn unintercept_protocol(&self, scheme: &str) -> Result<(), ProtocolError> {
        let result = self.registry.write().unintercept(scheme);
        match &result {
            Ok(()) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_UNINTERCEPT_SUCCEEDED,
                    latency_us: 1,
                });
                log::debug!("protocol '{scheme}' interception removed");
            }
            Err(error) => {
                emit_event(DiagnosticEvent::MessageReceived {
                    channel_id: CHANNEL_PROTOCOL_UNINTERCEPT_REJECTED,
                    latency_us: 1,
                });
                log::warn!("protocol '{scheme}' unintercept rejected: {error}");
            }
        }
        result
    }

    pub fn is_protocol_intercepted(&self, scheme: &str) -> bool {
        self.registry.read().is_intercepted(scheme)
    }

    /// True when the scheme resolves at all in this context: declared
    /// standard, served by a built-in factory, registered, or intercepted.
    pub fn is_protocol_handled(&self, scheme: &str) -> bool {
        let registry = self.registry.read();
        registry.is_registered(scheme)
            || registry.is_intercepted(scheme)
            || self.builtins.contains(scheme)
            || privilege::is_standard_scheme(scheme)
    }

    /// Intercepted scheme names, for the context's network-client layer.
    pub fn intercept_handlers(&self) -> Vec<String> {
        self.registry.read().intercept_handlers().schemes()
    }

    /// Populate `factories` with the scheme → factory mapping for a context
    /// of the given kind. Called once per context creation; the produced map
    /// does not track later registry mutations.
    pub fn register_url_loader_factories(&self, context: LoaderContext, factories: &mut FactoryMap) {
        {
            let registry = self.registry.read();
            register_url_loader_factories(&registry, context, &self.builtins, factories);
        }
        emit_event(DiagnosticEvent::MessageSent {
            channel_id: CHANNEL_LOADER_FACTORIES_BUILT,
            byte_len: factories.len(),
        });
        log::debug!(
            "built {} loader factories for {context:?} context",
            factories.len()
        );
    }
}

impl Default for ProtocolService {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! protocol_conveniences {
    ($(($register:ident, $intercept:ident, $kind:ident)),+ $(,)?) => {
        /// Thin per-kind wrappers kept for embedders that still call the
        /// legacy one-method-per-payload entry points.
        impl ProtocolService {
            $(
                pub fn $register<H>(&self, scheme: &str, handler: H) -> Result<(), ProtocolError>
                where
                    H: Fn(ProtocolRequest, ResponseSink) + Send + Sync + 'static,
                {
                    self.register_protocol(ProtocolType::$kind, scheme, handler)
                }

                pub fn $intercept<H>(&self, scheme: &str, handler: H) -> Result<(), ProtocolError>
                where
                    H: Fn(ProtocolRequest, ResponseSink) + Send + Sync + 'static,
                {
                    self.intercept_protocol(ProtocolType::$kind, scheme, handler)
                }
            )+
        }
    };
}

protocol_conveniences!(
    (register_buffer_protocol, intercept_buffer_protocol, Buffer),
    (register_string_protocol, intercept_string_protocol, String),
    (register_file_protocol, intercept_file_protocol, File),
    (register_http_protocol, intercept_http_protocol, Http),
    (register_stream_protocol, intercept_stream_protocol, Stream),
);
