/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Request, response, and completion-sink types shared by every scheme
//! handler, plus the stock built-in loader factories.

pub mod data;
pub mod file;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use http::{HeaderMap, Method};
use url::Url;

/// Raw content bytes exposed as a readable stream.
pub type ContentStream = Box<dyn std::io::Read + Send>;

/// Description of one request reaching a scheme handler.
#[derive(Debug, Clone)]
pub struct ProtocolRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub referrer: Option<Url>,
    pub body: Option<Vec<u8>>,
}

impl ProtocolRequest {
    /// A plain GET request for `url` with no headers, referrer, or body.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            referrer: None,
            body: None,
        }
    }
}

/// Kind of payload a registered handler answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolType {
    Buffer,
    String,
    File,
    Http,
    Stream,
}

/// A follow-up request the transport layer should dispatch upstream on the
/// handler's behalf.
#[derive(Debug, Clone)]
pub struct HttpForward {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
}

/// Payload produced by a scheme handler. The variant must match the
/// `ProtocolType` the handler was registered under.
pub enum ProtocolResponse {
    Buffer(Vec<u8>),
    String(String),
    File(PathBuf),
    Http(HttpForward),
    Stream(ContentStream),
}

impl ProtocolResponse {
    pub fn kind(&self) -> ProtocolType {
        match self {
            Self::Buffer(_) => ProtocolType::Buffer,
            Self::String(_) => ProtocolType::String,
            Self::File(_) => ProtocolType::File,
            Self::Http(_) => ProtocolType::Http,
            Self::Stream(_) => ProtocolType::Stream,
        }
    }
}

impl fmt::Debug for ProtocolResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::String(text) => f.debug_tuple("String").field(&text.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Http(forward) => f.debug_tuple("Http").field(&forward.url).finish(),
            Self::Stream(_) => f.write_str("Stream(<readable>)"),
        }
    }
}

/// Transport-level failure reported through a completion sink. Opaque to the
/// registry: these never become registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The load was dropped without an answer.
    Aborted,
    Failed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => f.write_str("load aborted before completion"),
            Self::Failed(reason) => write!(f, "load failed: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// One-shot completion sink handed to a scheme handler alongside the request.
///
/// The sink is consumed by `succeed`/`fail`, so a handler can complete it at
/// most once; dropping it unanswered fails the load as aborted.
pub struct ResponseSink {
    deliver: Option<Box<dyn FnOnce(Result<ProtocolResponse, TransportError>) + Send>>,
}

impl ResponseSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: FnOnce(Result<ProtocolResponse, TransportError>) + Send + 'static,
    {
        Self {
            deliver: Some(Box::new(deliver)),
        }
    }

    pub fn succeed(mut self, response: ProtocolResponse) {
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

impl Drop for ResponseSink {
    fn drop(&mut self) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Err(TransportError::Aborted));
        }
    }
}

impl fmt::Debug for ResponseSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSink")
            .field("answered", &self.deliver.is_none())
            .finish()
    }
}

/// Callback invoked once per matching request. May complete its sink later,
/// from any thread; it never re-enters registry bookkeeping.
pub type ProtocolHandler = Arc<dyn Fn(ProtocolRequest, ResponseSink) + Send + Sync>;
