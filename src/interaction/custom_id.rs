//! Custom-id codec for buttons, select menus and modals
//!
//! A custom id is `<command><SEP><action>[<SEP><param>]*` where `SEP` is the
//! ASCII record separator. Ids written by older releases used `\0` or `,` and
//! decode to [`NormalizationError::LegacyFormat`].
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Switch to the record separator, recognise retired delimiters
//! - 1.0.0: Comma separated ids

use std::fmt;

use crate::core::error::{CustomIdError, NormalizationError};

/// Current segment delimiter
pub const DELIMITER: char = '\u{1e}';
/// Delimiters of retired encodings
const LEGACY_DELIMITERS: [char; 2] = ['\u{0}', ','];
/// Discord rejects longer custom ids
pub const MAX_CUSTOM_ID_LENGTH: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomId {
    pub command: String,
    pub action: String,
    pub params: Vec<String>,
}

impl CustomId {
    pub fn new(command: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            action: action.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: impl ToString) -> Self {
        self.params.push(param.to_string());
        self
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Encode into the wire format, enforcing the platform length limit
    pub fn encode(&self) -> Result<String, CustomIdError> {
        let mut segments = Vec::with_capacity(self.params.len() + 2);
        segments.push(self.command.as_str());
        segments.push(self.action.as_str());
        segments.extend(self.params.iter().map(String::as_str));

        for segment in &segments[..2] {
            if segment.is_empty() {
                return Err(CustomIdError::EmptySegment);
            }
        }
        if let Some(bad) = segments.iter().find(|s| s.contains(DELIMITER)) {
            return Err(CustomIdError::DelimiterInSegment(bad.to_string()));
        }

        let encoded = segments.join(&DELIMITER.to_string());
        let len = encoded.chars().count();
        if len > MAX_CUSTOM_ID_LENGTH {
            return Err(CustomIdError::TooLong {
                len,
                max: MAX_CUSTOM_ID_LENGTH,
            });
        }
        Ok(encoded)
    }

    /// Decode a custom id received from the platform.
    ///
    /// Only checks the shape; whether the command exists is decided by the
    /// normalizer against the registry.
    pub fn decode(raw: &str) -> Result<Self, NormalizationError> {
        if !raw.contains(DELIMITER) {
            if let Some(pos) = raw.find(LEGACY_DELIMITERS) {
                let command = &raw[..pos];
                if !command.is_empty() {
                    return Err(NormalizationError::LegacyFormat(command.to_string()));
                }
            }
            return Err(NormalizationError::UnparsableCustomId(raw.to_string()));
        }

        let mut segments = raw.split(DELIMITER);
        let command = segments.next().unwrap_or_default();
        let action = segments.next().unwrap_or_default();
        if command.is_empty() || action.is_empty() {
            return Err(NormalizationError::UnparsableCustomId(raw.to_string()));
        }

        Ok(Self {
            command: command.to_string(),
            action: action.to_string(),
            params: segments.map(str::to_string).collect(),
        })
    }
}

/// Human readable form for logs, segments joined with `:`
impl fmt::Display for CustomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.command, self.action)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}
