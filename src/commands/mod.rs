//! # Command System
//!
//! Command handlers, their registry and the engine dispatching events to them.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Handlers decide on config snapshots, engine owns persistence
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Slash-only command system

pub mod context;
pub mod definition;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod registry;

pub use context::HandlerContext;
pub use definition::{CommandDefinition, OptionDefinition, OptionKind};
pub use dispatcher::{InteractionEngine, Outcome};
pub use handler::{CommandHandler, ConfigChange, HandlerResult, ReplaySafety};
pub use handlers::{create_all_handlers, create_registry};
pub use registry::{CommandRegistry, RegistryError};
