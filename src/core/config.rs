//! Runtime configuration loaded from the environment
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: `DISCORD_GUILD_ID` is parsed up front, a bad value aborts startup
//! - 1.0.0: Discord credentials, storage path, dice limits and CAS retry bound

use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::dice::DiceLimits;

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub discord_guild_id: Option<u64>,
    pub database_path: String,
    pub log_level: String,
    pub dice_limits: DiceLimits,
    pub evaluation_timeout: Duration,
    pub cas_max_retries: u32,
}

impl Config {
    /// Read the configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first when a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("DISCORD_TOKEN environment variable is not set"))?;

        let defaults = DiceLimits::default();
        let dice_limits = DiceLimits {
            max_dice: parse_or(&lookup, "DICE_MAX_DICE", defaults.max_dice)?,
            max_sides: parse_or(&lookup, "DICE_MAX_SIDES", defaults.max_sides)?,
            max_expression_length: parse_or(
                &lookup,
                "DICE_MAX_EXPRESSION_LENGTH",
                defaults.max_expression_length,
            )?,
        };

        let discord_guild_id = match lookup("DISCORD_GUILD_ID").filter(|id| !id.trim().is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("DISCORD_GUILD_ID must be a guild id, got {raw:?}"))?,
            ),
            None => None,
        };

        Ok(Self {
            discord_token,
            discord_guild_id,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "dicebot.db".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dice_limits,
            evaluation_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DICE_EVALUATION_TIMEOUT_MS",
                2000u64,
            )?),
            cas_max_retries: parse_or(&lookup, "CAS_MAX_RETRIES", 3u32)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}
