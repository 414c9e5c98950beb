//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Per-event context carrying channel answer defaults
//! - 1.0.0: Initial implementation with the dice pipeline

use std::sync::Arc;

use crate::dice::DicePipeline;
use crate::store::AnswerFormattingConfig;

/// Collaborators a handler may use while deciding
///
/// Handlers never see the config store; whatever state they need arrives
/// as the loaded snapshot or in here.
#[derive(Clone)]
pub struct HandlerContext {
    pub dice: Arc<DicePipeline>,
    /// Answer defaults configured for the channel, if any
    pub channel_defaults: Option<AnswerFormattingConfig>,
}

impl HandlerContext {
    pub fn new(dice: Arc<DicePipeline>) -> Self {
        Self {
            dice,
            channel_defaults: None,
        }
    }

    pub fn with_channel_defaults(mut self, defaults: Option<AnswerFormattingConfig>) -> Self {
        self.channel_defaults = defaults;
        self
    }
}
