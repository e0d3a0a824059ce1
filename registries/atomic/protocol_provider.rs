/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Handler provider fan-in for embedder-module registration.
//!
//! Embedder modules implement this trait (or hand in a closure) to register
//! their scheme handlers into a context's ProtocolRegistry during activation.

use super::protocol::ProtocolRegistry;

/// Trait for protocol handler providers.
pub trait ProtocolHandlerProvider {
    /// Register this provider's scheme handlers into the registry.
    fn register(&self, registry: &mut ProtocolRegistry);
}

/// Collection of provider functions applied to a registry at activation time.
pub struct ProtocolHandlerProviders {
    providers: Vec<Box<dyn Fn(&mut ProtocolRegistry)>>,
}

impl ProtocolHandlerProviders {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a provider function.
    pub fn register_fn<F>(&mut self, f: F)
    where
        F: Fn(&mut ProtocolRegistry) + 'static,
    {
        self.providers.push(Box::new(f));
    }

    /// Register a provider object.
    pub fn register_provider<P>(&mut self, provider: P)
    where
        P: ProtocolHandlerProvider + 'static,
    {
        self.providers
            .push(Box::new(move |registry| provider.register(registry)));
    }

    /// Apply all registered providers to the given registry.
    pub fn apply_all(&self, registry: &mut ProtocolRegistry) {
        for provider in &self.providers {
            provider(registry);
        }
    }
}

impl Default for ProtocolHandlerProviders {
    fn default() -> Self {
        Self::new()
    }
}
