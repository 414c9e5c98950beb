//! Error taxonomy shared by the interaction engine
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add `StoreError::Corrupt` for blobs that survive no upgrade path
//! - 1.0.0: Initial taxonomy (normalization, handler, evaluation, store)

use thiserror::Error;

/// Failure to turn a platform event into an [`InteractionEvent`](crate::interaction::InteractionEvent)
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("unparsable custom id {0:?}")]
    UnparsableCustomId(String),
    #[error("no handler registered for command {0:?}")]
    UnknownCommand(String),
    #[error("custom id for {0:?} uses a retired encoding")]
    LegacyFormat(String),
}

/// Failure to build an outbound custom id
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CustomIdError {
    #[error("custom id is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("custom id segment {0:?} contains the delimiter")]
    DelimiterInSegment(String),
    #[error("custom id segment is empty")]
    EmptySegment,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("invalid dice expression: {0}")]
    SyntaxError(String),
    #[error("dice expression too large: {0}")]
    LimitExceeded(String),
    #[error("dice evaluation failed: {0}")]
    InternalError(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("action not permitted for this user")]
    Forbidden,
    #[error("the message state changed while the action was processed")]
    Superseded,
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no configuration stored for {0}")]
    NotFound(String),
    #[error("version conflict on {key}: expected {expected}")]
    VersionConflict { key: String, expected: u64 },
    #[error("configuration for {0} already exists")]
    AlreadyExists(String),
    #[error("config store unavailable: {0}")]
    Unavailable(String),
    #[error("stored configuration for {key} is unreadable: {detail}")]
    Corrupt { key: String, detail: String },
}

impl StoreError {
    /// Races between concurrent writers, retried or reported neutrally
    pub fn is_race(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::AlreadyExists(_) | Self::NotFound(_)
        )
    }
}

impl From<sqlite::Error> for StoreError {
    fn from(err: sqlite::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_error_converts_into_handler_error() {
        let err: HandlerError = EvaluationError::LimitExceeded("1000d1000".into()).into();
        assert_eq!(
            err,
            HandlerError::Evaluation(EvaluationError::LimitExceeded("1000d1000".into()))
        );
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_store_error_race_classification() {
        assert!(StoreError::VersionConflict { key: "message:1".into(), expected: 3 }.is_race());
        assert!(StoreError::NotFound("message:1".into()).is_race());
        assert!(!StoreError::Unavailable("disk full".into()).is_race());
    }
}
