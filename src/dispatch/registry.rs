use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::MutationHandler;

type HandlerFactory = Box<dyn Fn() -> Box<dyn MutationHandler> + Send + Sync>;

/// Registry mapping stable handler identifiers to constructor functions.
///
/// Populated at process start; resolution failure is a plain lookup miss,
/// not reflection. Administrators reference these identifiers from
/// handler configuration records.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: RwLock<HashMap<String, HandlerFactory>>,
}

// Process-wide default registry instance.
lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<HandlerRegistry> = Arc::new(HandlerRegistry::new());
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide registry. Hosts that want isolation (tests,
    /// multi-tenant embeddings) construct their own instead.
    pub fn global() -> &'static Arc<HandlerRegistry> {
        &GLOBAL_REGISTRY
    }

    pub fn register<F>(&self, identifier: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn MutationHandler> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.into(), Box::new(factory));
    }

    /// Construct a fresh handler instance, or `None` for an unknown
    /// identifier.
    pub fn resolve(&self, identifier: &str) -> Option<Box<dyn MutationHandler>> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .map(|factory| factory())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test-support removal of every registration.
    pub fn clear(&self) {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::HandlerContext;

    struct NoopHandler;

    impl MutationHandler for NoopHandler {
        fn set_context(&mut self, _ctx: HandlerContext) {}

        fn execute(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = HandlerRegistry::new();
        registry.register("noop", || Box::new(NoopHandler));

        assert!(registry.contains("noop"));
        assert!(registry.resolve("noop").is_some());
        assert!(registry.resolve("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_constructs_fresh_instances() {
        let registry = HandlerRegistry::new();
        let built = Arc::new(RwLock::new(0u32));
        let counter = built.clone();
        registry.register("noop", move || {
            *counter.write().unwrap() += 1;
            Box::new(NoopHandler)
        });

        registry.resolve("noop").unwrap();
        registry.resolve("noop").unwrap();
        assert_eq!(*built.read().unwrap(), 2);
    }

    #[test]
    fn test_clear() {
        let registry = HandlerRegistry::new();
        registry.register("noop", || Box::new(NoopHandler));
        registry.clear();
        assert!(registry.is_empty());
    }
}
