/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Loader-factory dispatch: turns the current handler registry state into
//! the per-scheme factory map a browsing context installs at creation time.
//!
//! Precedence per scheme: interception entry, then registered entry, then the
//! embedder's built-in factory for the requested context kind. Schemes with
//! none of the three are absent from the produced map; requests to them fail
//! at a higher layer.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::protocols::{
    ContentStream, HttpForward, ProtocolRequest, ProtocolResponse, ProtocolType, ResponseSink,
    TransportError,
};
use crate::registries::CHANNEL_LOADER_INTERCEPT_OVERRIDE;
use crate::registries::atomic::protocol::{ProtocolEntry, ProtocolRegistry};
use crate::runtime::diagnostics::{DiagnosticEvent, emit_event};

/// Kind of browsing context the factory map is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderContext {
    /// Ordinary page/navigation context with full network access.
    Network,
    /// Isolated context such as a service worker or extension background.
    NonNetwork,
}

/// Wrapped output of a scheme load, ready for the transport layer.
pub struct ResourceResponse {
    pub mime_type: Option<String>,
    pub body: ResourceBody,
}

pub enum ResourceBody {
    Bytes(Vec<u8>),
    File(PathBuf),
    /// Re-dispatch the load as an upstream request.
    Upstream(HttpForward),
    Stream(ContentStream),
}

impl fmt::Debug for ResourceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Upstream(forward) => f.debug_tuple("Upstream").field(&forward.url).finish(),
            Self::Stream(_) => f.write_str("Stream(<readable>)"),
        }
    }
}

impl fmt::Debug for ResourceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceResponse")
            .field("mime_type", &self.mime_type)
            .field("body", &self.body)
            .finish()
    }
}

/// One-shot transport-side completion for a single load. Dropping it
/// unanswered fails the load as aborted, mirroring `ResponseSink`.
pub struct LoaderClient {
    deliver: Option<Box<dyn FnOnce(Result<ResourceResponse, TransportError>) + Send>>,
}

impl LoaderClient {
    pub fn new<F>(deliver: F) -> Self
    where
        F: FnOnce(Result<ResourceResponse, TransportError>) + Send + 'static,
    {
        Self {
            deliver: Some(Box::new(deliver)),
        }
    }

    pub fn succeed(mut self, response: ResourceResponse) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Ok(response));
        }
    }

    pub fn fail(mut self, error: TransportError) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Err(error));
        }
    }
}

impl Drop for LoaderClient {
    fn drop(&mut self) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Err(TransportError::Aborted));
        }
    }
}

/// Transport-layer object responsible for turning a request for one scheme
/// into a response.
pub trait SchemeLoaderFactory: Send + Sync {
    fn start(&self, request: ProtocolRequest, client: LoaderClient);
}

/// Externally-owned factory map populated by [`register_url_loader_factories`].
pub type FactoryMap = HashMap<String, Arc<dyn SchemeLoaderFactory>>;

/// Factory wrapping one registered or intercepted handler entry.
pub(crate) struct HandlerLoaderFactory {
    scheme: String,
    entry: ProtocolEntry,
}

impl HandlerLoaderFactory {
    pub(crate) fn new(scheme: String, entry: ProtocolEntry) -> Self {
        Self { scheme, entry }
    }
}

impl SchemeLoaderFactory for HandlerLoaderFactory {
    fn start(&self, request: ProtocolRequest, client: LoaderClient) {
        let declared = self.entry.kind;
        let scheme = self.scheme.clone();
        let sink = ResponseSink::new(move |result| match result {
            Ok(response) if response.kind() != declared => {
                log::warn!(
                    "scheme '{}' handler answered with {:?} payload but was registered as {:?}",
                    scheme,
                    response.kind(),
                    declared
                );
                client.fail(TransportError::Failed(format!(
                    "payload kind {:?} does not match declared kind {:?}",
                    response.kind(),
                    declared
                )));
            }
            Ok(response) => client.succeed(wrap_response(response)),
            Err(error) => client.fail(error),
        });
        (self.entry.handler)(request, sink);
    }
}

/// Wrap a kind-checked handler payload into a transport response, filling in
/// a MIME type where the payload implies one.
fn wrap_response(response: ProtocolResponse) -> ResourceResponse {
    match response {
        ProtocolResponse::Buffer(bytes) => ResourceResponse {
            mime_type: Some("application/octet-stream".to_string()),
            body: ResourceBody::Bytes(bytes),
        },
        ProtocolResponse::String(text) => ResourceResponse {
            mime_type: Some("text/plain".to_string()),
            body: ResourceBody::Bytes(text.into_bytes()),
        },
        ProtocolResponse::File(path) => ResourceResponse {
            mime_type: mime_guess::from_path(&path).first_raw().map(str::to_string),
            body: ResourceBody::File(path),
        },
        ProtocolResponse::Http(forward) => ResourceResponse {
            mime_type: None,
            body: ResourceBody::Upstream(forward),
        },
        ProtocolResponse::Stream(stream) => ResourceResponse {
            mime_type: None,
            body: ResourceBody::Stream(stream),
        },
    }
}

struct BuiltinFactory {
    factory: Arc<dyn SchemeLoaderFactory>,
    network_only: bool,
}

/// The small fixed set of schemes the embedder always supports. The stock
/// default carries `file` and `data`; embedders with blob or filesystem
/// stores insert their own factories for those slots.
pub struct BuiltinFactories {
    entries: HashMap<String, BuiltinFactory>,
}

impl BuiltinFactories {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Install a built-in factory available to every context kind.
    pub fn insert(&mut self, scheme: &str, factory: Arc<dyn SchemeLoaderFactory>) {
        self.entries.insert(
            scheme.to_ascii_lowercase(),
            BuiltinFactory {
                factory,
                network_only: false,
            },
        );
    }

    /// Install a built-in factory offered only to network contexts.
    pub fn insert_network_only(&mut self, scheme: &str, factory: Arc<dyn SchemeLoaderFactory>) {
        self.entries.insert(
            scheme.to_ascii_lowercase(),
            BuiltinFactory {
                factory,
                network_only: true,
            },
        );
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.entries.contains_key(&scheme.to_ascii_lowercase())
    }

    pub fn get(&self, scheme: &str) -> Option<Arc<dyn SchemeLoaderFactory>> {
        self.entries
            .get(&scheme.to_ascii_lowercase())
            .map(|entry| Arc::clone(&entry.factory))
    }

    fn schemes_for(&self, context: LoaderContext) -> Vec<String> {
        let mut schemes: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| context == LoaderContext::Network || !entry.network_only)
            .map(|(scheme, _)| scheme.clone())
            .collect();
        schemes.sort();
        schemes
    }
}

impl Default for BuiltinFactories {
    fn default() -> Self {
        let mut builtins = Self::empty();
        builtins.insert("file", Arc::new(crate::protocols::file::FileLoaderFactory));
        builtins.insert("data", Arc::new(crate::protocols::data::DataLoaderFactory));
        builtins
    }
}

/// Populate `factories` with the complete scheme → factory mapping for one
/// context kind, reading the registry state as of this call.
///
/// The produced map is a snapshot: loader factories for an already-created
/// context are fixed at context-creation time, so later registrations and
/// interceptions affect only subsequently built maps.
pub fn register_url_loader_factories(
    registry: &ProtocolRegistry,
    context: LoaderContext,
    builtins: &BuiltinFactories,
    factories: &mut FactoryMap,
) {
    for (scheme, entry) in registry.intercept_handlers().snapshot() {
        if registry.is_registered(&scheme) || builtins.contains(&scheme) {
            emit_event(DiagnosticEvent::MessageSent {
                channel_id: CHANNEL_LOADER_INTERCEPT_OVERRIDE,
                byte_len: scheme.len(),
            });
            log::debug!("interception overrides existing resolution for scheme '{scheme}'");
        }
        factories.insert(
            scheme.clone(),
            Arc::new(HandlerLoaderFactory::new(scheme, entry)),
        );
    }

    for (scheme, entry) in registry.handlers().snapshot() {
        if factories.contains_key(&scheme) {
            continue;
        }
        factories.insert(
            scheme.clone(),
            Arc::new(HandlerLoaderFactory::new(scheme, entry)),
        );
    }

    for scheme in builtins.schemes_for(context) {
        if factories.contains_key(&scheme) {
            continue;
        }
        if let Some(factory) = builtins.get(&scheme) {
            factories.insert(scheme, factory);
        }
    }
}
