// Core layer - shared types and configuration
pub mod core;

// Domain layer - events, stored state, dice
pub mod dice;
pub mod interaction;
pub mod store;

// Presentation layer - transport-neutral answers
pub mod render;

// Application layer
pub mod commands;

// Infrastructure - Discord transport
pub mod discord;

pub use crate::core::Config;
pub use commands::{create_registry, InteractionEngine, Outcome};
pub use dice::{DiceLimits, DicePipeline, StandardEvaluator};
pub use interaction::{InteractionEvent, PlatformEvent};
pub use store::{ConfigRepository, MemoryConfigStore, SqliteConfigStore};
