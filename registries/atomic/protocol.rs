use std::collections::HashMap;
use std::fmt;

use crate::protocols::{ProtocolHandler, ProtocolType};

/// Closed error taxonomy for registry mutations. Success is `Ok(())`; no
/// other error kinds are produced by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    Registered,
    NotRegistered,
    Intercepted,
    NotIntercepted,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => f.write_str("The scheme has been registered"),
            Self::NotRegistered => f.write_str("The scheme has not been registered"),
            Self::Intercepted => f.write_str("The scheme has been intercepted"),
            Self::NotIntercepted => f.write_str("The scheme has not been intercepted"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// One registered or intercepted handler together with the payload kind it
/// was declared under.
#[derive(Clone)]
pub struct ProtocolEntry {
    pub kind: ProtocolType,
    pub handler: ProtocolHandler,
}

impl fmt::Debug for ProtocolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolEntry")
            .field("kind", &self.kind)
            .field("handler", &"<callback>")
            .finish()
    }
}

/// Scheme → handler map with case-insensitive keys. Inserting an occupied
/// key fails instead of overwriting.
#[derive(Debug, Clone, Default)]
pub struct HandlersMap {
    entries: HashMap<String, ProtocolEntry>,
}

impl HandlersMap {
    pub fn insert(&mut self, scheme: &str, entry: ProtocolEntry) -> bool {
        let key = scheme.to_ascii_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    pub fn remove(&mut self, scheme: &str) -> bool {
        self.entries.remove(&scheme.to_ascii_lowercase()).is_some()
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.entries.contains_key(&scheme.to_ascii_lowercase())
    }

    pub fn get(&self, scheme: &str) -> Option<&ProtocolEntry> {
        self.entries.get(&scheme.to_ascii_lowercase())
    }

    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.entries.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    pub fn snapshot(&self) -> Vec<(String, ProtocolEntry)> {
        let mut entries: Vec<(String, ProtocolEntry)> = self
            .entries
            .iter()
            .map(|(scheme, entry)| (scheme.clone(), entry.clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-browsing-context handler registry: independent registered and
/// intercepted maps over the same scheme namespace.
///
/// Each scheme runs two independent two-state machines (registration and
/// interception); a transition attempted from the wrong state fails with the
/// matching [`ProtocolError`] and leaves the maps untouched.
#[derive(Debug, Clone, Default)]
pub struct ProtocolRegistry {
    handlers: HandlersMap,
    intercept_handlers: HandlersMap,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        kind: ProtocolType,
        scheme: &str,
        handler: ProtocolHandler,
    ) -> Result<(), ProtocolError> {
        if !self.handlers.insert(scheme, ProtocolEntry { kind, handler }) {
            return Err(ProtocolError::Registered);
        }
        Ok(())
    }

    pub fn unregister(&mut self, scheme: &str) -> Result<(), ProtocolError> {
        if !self.handlers.remove(scheme) {
            return Err(ProtocolError::NotRegistered);
        }
        Ok(())
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.handlers.contains(scheme)
    }

    pub fn intercept(
        &mut self,
        kind: ProtocolType,
        scheme: &str,
        handler: ProtocolHandler,
    ) -> Result<(), ProtocolError> {
        if !self
            .intercept_handlers
            .insert(scheme, ProtocolEntry { kind, handler })
        {
            return Err(ProtocolError::Intercepted);
        }
        Ok(())
    }

    pub fn unintercept(&mut self, scheme: &str) -> Result<(), ProtocolError> {
        if !self.intercept_handlers.remove(scheme) {
            return Err(ProtocolError::NotIntercepted);
        }
        Ok(())
    }

    pub fn is_intercepted(&self, scheme: &str) -> bool {
        self.intercept_handlers.contains(scheme)
    }

    pub fn registered(&self, scheme: &str) -> Option<&ProtocolEntry> {
        self.handlers.get(scheme)
    }

    pub fn intercepted(&self, scheme: &str) -> Option<&ProtocolEntry> {
        self.intercept_handlers.get(scheme)
    }

    pub fn handlers(&self) -> &HandlersMap {
        &self.handlers
    }

    /// Read-only view for the context's network-client layer.
    pub fn intercept_handlers(&self) -> &HandlersMap {
        &self.intercept_handlers
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::protocols::ProtocolHandler;

    fn noop_handler() -> ProtocolHandler {
        Arc::new(|_request, _sink| {})
    }

    #[test]
    fn register_then_query_then_duplicate_then_unregister_round_trip() {
        let mut registry = ProtocolRegistry::new();

        assert!(!registry.is_registered("myapp"));
        assert_eq!(
            registry.register(ProtocolType::Buffer, "myapp", noop_handler()),
            Ok(())
        );
        assert!(registry.is_registered("myapp"));

        assert_eq!(
            registry.register(ProtocolType::Buffer, "myapp", noop_handler()),
            Err(ProtocolError::Registered)
        );

        assert_eq!(registry.unregister("myapp"), Ok(()));
        assert!(!registry.is_registered("myapp"));
        assert_eq!(
            registry.unregister("myapp"),
            Err(ProtocolError::NotRegistered)
        );
    }

    #[test]
    fn unregister_of_never_registered_scheme_reports_not_registered() {
        let mut registry = ProtocolRegistry::new();
        assert_eq!(
            registry.unregister("ghost"),
            Err(ProtocolError::NotRegistered)
        );
    }

    #[test]
    fn registration_and_interception_state_machines_are_independent() {
        let mut registry = ProtocolRegistry::new();

        assert_eq!(
            registry.register(ProtocolType::String, "dual", noop_handler()),
            Ok(())
        );
        assert_eq!(
            registry.intercept(ProtocolType::Http, "dual", noop_handler()),
            Ok(())
        );

        assert!(registry.is_registered("dual"));
        assert!(registry.is_intercepted("dual"));

        assert_eq!(registry.unregister("dual"), Ok(()));
        assert!(registry.is_intercepted("dual"));
        assert_eq!(registry.unintercept("dual"), Ok(()));
        assert_eq!(
            registry.unintercept("dual"),
            Err(ProtocolError::NotIntercepted)
        );
    }

    #[test]
    fn duplicate_interception_reports_intercepted() {
        let mut registry = ProtocolRegistry::new();
        assert_eq!(
            registry.intercept(ProtocolType::File, "http", noop_handler()),
            Ok(())
        );
        assert_eq!(
            registry.intercept(ProtocolType::File, "http", noop_handler()),
            Err(ProtocolError::Intercepted)
        );
    }

    #[test]
    fn scheme_keys_are_case_insensitive() {
        let mut registry = ProtocolRegistry::new();
        assert_eq!(
            registry.register(ProtocolType::Buffer, "MyApp", noop_handler()),
            Ok(())
        );
        assert!(registry.is_registered("myapp"));
        assert_eq!(
            registry.register(ProtocolType::Buffer, "MYAPP", noop_handler()),
            Err(ProtocolError::Registered)
        );
        assert_eq!(registry.unregister("myApp"), Ok(()));
    }

    #[test]
    fn failed_registration_preserves_original_handler() {
        let mut registry = ProtocolRegistry::new();
        let original = noop_handler();
        let replacement = noop_handler();

        assert_eq!(
            registry.register(ProtocolType::Buffer, "keep", Arc::clone(&original)),
            Ok(())
        );
        assert_eq!(
            registry.register(ProtocolType::Stream, "keep", Arc::clone(&replacement)),
            Err(ProtocolError::Registered)
        );

        let entry = registry.registered("keep").expect("entry should remain");
        assert_eq!(entry.kind, ProtocolType::Buffer);
        assert!(Arc::ptr_eq(&entry.handler, &original));
    }

    proptest::proptest! {
        #[test]
        fn register_unregister_round_trip_leaves_no_state(scheme in "[a-z][a-z0-9+.-]{0,12}") {
            let mut registry = ProtocolRegistry::new();
            proptest::prop_assert_eq!(
                registry.register(ProtocolType::Buffer, &scheme, noop_handler()),
                Ok(())
            );
            proptest::prop_assert!(registry.is_registered(&scheme));
            proptest::prop_assert_eq!(
                registry.register(ProtocolType::Buffer, &scheme, noop_handler()),
                Err(ProtocolError::Registered)
            );
            proptest::prop_assert_eq!(registry.unregister(&scheme), Ok(()));
            proptest::prop_assert!(!registry.is_registered(&scheme));
            proptest::prop_assert_eq!(registry.unregister(&scheme), Err(ProtocolError::NotRegistered));
        }
    }

    #[test]
    fn queries_do_not_mutate_state() {
        let mut registry = ProtocolRegistry::new();
        registry
            .register(ProtocolType::Buffer, "stable", noop_handler())
            .expect("registration should succeed");

        for _ in 0..3 {
            assert!(registry.is_registered("stable"));
            assert!(!registry.is_intercepted("stable"));
        }
        assert_eq!(registry.handlers().len(), 1);
        assert!(registry.intercept_handlers().is_empty());
    }
}
