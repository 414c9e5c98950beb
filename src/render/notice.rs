//! Ephemeral notices for every error class a user can run into

use crate::core::error::{EvaluationError, HandlerError, NormalizationError};
use crate::core::i18n::{tr, Text};

use super::{MessageBody, PlatformMessage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    InvalidArgument(String),
    Forbidden,
    Superseded,
    NoLongerActive,
    LegacyButton,
    UnknownCommand,
    Unparsable,
    Evaluation(EvaluationError),
    StateUnreadable,
    GenericFailure,
}

impl Notice {
    pub fn text(&self, locale: &str) -> String {
        match self {
            Self::InvalidArgument(detail) => {
                format!("{}: {detail}", tr(locale, Text::InvalidArgument))
            }
            Self::Forbidden => tr(locale, Text::Forbidden).to_string(),
            Self::Superseded => tr(locale, Text::Superseded).to_string(),
            Self::NoLongerActive => tr(locale, Text::NoLongerActive).to_string(),
            Self::LegacyButton => tr(locale, Text::LegacyButton).to_string(),
            Self::UnknownCommand => tr(locale, Text::UnknownCommand).to_string(),
            Self::Unparsable => tr(locale, Text::Unparsable).to_string(),
            Self::Evaluation(EvaluationError::SyntaxError(detail)) => {
                format!("{}: {detail}", tr(locale, Text::SyntaxError))
            }
            Self::Evaluation(EvaluationError::LimitExceeded(detail)) => {
                format!("{}: {detail}", tr(locale, Text::LimitExceeded))
            }
            Self::Evaluation(EvaluationError::InternalError(_)) => {
                tr(locale, Text::EvaluationFailed).to_string()
            }
            Self::StateUnreadable => tr(locale, Text::StateUnreadable).to_string(),
            Self::GenericFailure => tr(locale, Text::GenericFailure).to_string(),
        }
    }

    /// Notices are always ephemeral and never carry components
    pub fn render(&self, locale: &str) -> PlatformMessage {
        PlatformMessage::Ephemeral(MessageBody {
            content: self.text(locale),
            ..MessageBody::default()
        })
    }
}

impl From<&NormalizationError> for Notice {
    fn from(err: &NormalizationError) -> Self {
        match err {
            NormalizationError::UnparsableCustomId(_) => Self::Unparsable,
            NormalizationError::UnknownCommand(_) => Self::UnknownCommand,
            NormalizationError::LegacyFormat(_) => Self::LegacyButton,
        }
    }
}

impl From<&HandlerError> for Notice {
    fn from(err: &HandlerError) -> Self {
        match err {
            HandlerError::InvalidArgument(detail) => Self::InvalidArgument(detail.clone()),
            HandlerError::Forbidden => Self::Forbidden,
            HandlerError::Superseded => Self::Superseded,
            HandlerError::Evaluation(e) => Self::Evaluation(e.clone()),
        }
    }
}
