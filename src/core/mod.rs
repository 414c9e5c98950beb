//! # Core Module
//!
//! Configuration, error taxonomy, translations and Discord limits.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add i18n module with English and German texts
//! - 1.0.0: Initial creation with config, error and response modules

pub mod config;
pub mod error;
pub mod i18n;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::{CustomIdError, EvaluationError, HandlerError, NormalizationError, StoreError};
pub use i18n::{tr, Text};
pub use response::{
    truncate_for_embed, truncate_for_message, truncate_label, truncate_to, EMBED_LIMIT,
    LABEL_LIMIT, MAX_ROWS, MAX_ROW_COMPONENTS, MESSAGE_LIMIT,
};
