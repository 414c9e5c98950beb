//! # Discord Transport
//!
//! Everything that touches serenity: turning gateway interactions into
//! [`PlatformEvent`](crate::interaction::PlatformEvent)s, delivering rendered
//! messages back, and registering slash commands.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Interaction extraction, response delivery, command registration

pub mod deliver;
pub mod extract;
pub mod slash;

pub use deliver::{deliver, Incoming};
pub use extract::{from_command, from_component, from_modal};
pub use slash::{build_command, register_global_commands, register_guild_commands};
