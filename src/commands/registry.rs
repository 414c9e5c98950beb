//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: One name per handler, duplicate registration is an error
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::definition::CommandDefinition;
use super::handler::CommandHandler;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command {0:?} registered twice")]
    Duplicate(String),
    #[error("no handler for command {0:?}")]
    NotFound(String),
}

/// Registry mapping command names to handlers
///
/// Built once at startup and then shared behind an `Arc`; nothing mutates
/// it afterwards, so lookups need no synchronization.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(RollHandler))?;
/// let registry = Arc::new(registry);
///
/// let handler = registry.resolve("roll")?;
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its command name
    ///
    /// A name can only be claimed once; a second claim is a configuration
    /// error and leaves the registry unchanged.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), RegistryError> {
        let name = handler.command_name();
        if self.handlers.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Get the handler owning a command name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn CommandHandler>, RegistryError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Get all registered command names
    pub fn command_names(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    /// Slash command definitions of every handler, sorted by name
    pub fn definitions(&self) -> Vec<CommandDefinition> {
        let mut definitions: Vec<_> = self.handlers.values().map(|h| h.definition()).collect();
        definitions.sort_by_key(|d| d.name);
        definitions
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::HandlerContext;
    use crate::commands::handler::{HandlerResult, ReplaySafety};
    use crate::core::error::HandlerError;
    use crate::interaction::InteractionEvent;
    use crate::render::{Answer, TargetMessagePolicy};
    use crate::store::CommandConfig;
    use async_trait::async_trait;

    // Mock handler for testing
    struct MockHandler {
        name: &'static str,
    }

    #[async_trait]
    impl CommandHandler for MockHandler {
        fn command_name(&self) -> &'static str {
            self.name
        }

        fn definition(&self) -> CommandDefinition {
            CommandDefinition::new(self.name, "mock")
        }

        fn replay_safety(&self, _action: &str) -> ReplaySafety {
            ReplaySafety::Idempotent
        }

        async fn handle(
            &self,
            _ctx: &HandlerContext,
            _event: &InteractionEvent,
            _current: Option<&CommandConfig>,
        ) -> Result<HandlerResult, HandlerError> {
            Ok(HandlerResult::unchanged(
                Answer::text("ok"),
                TargetMessagePolicy::CreateNew,
            ))
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_and_resolve() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler { name: "roll" })).unwrap();

        assert!(registry.contains("roll"));
        assert!(!registry.contains("r"));
        assert_eq!(registry.resolve("roll").unwrap().command_name(), "roll");
        assert_eq!(
            registry.resolve("missing").err(),
            Some(RegistryError::NotFound("missing".into()))
        );
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler { name: "roll" })).unwrap();
        let err = registry
            .register(Arc::new(MockHandler { name: "roll" }))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("roll".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_definitions_sorted() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(MockHandler { name: "zeta" })).unwrap();
        registry.register(Arc::new(MockHandler { name: "alpha" })).unwrap();
        let names: Vec<_> = registry.definitions().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_registry_default() {
        let registry = CommandRegistry::default();
        assert!(registry.is_empty());
    }
}
