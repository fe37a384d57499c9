use thiserror::Error;

use crate::roles::Role;

/// Failures that abort a single survey file. None of these abort a batch.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("no column found for required role `{role}`")]
    ColumnNotFound { role: Role },
    #[error("cannot parse {file}: {reason}")]
    ParseFailure { file: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurveyError {
    pub fn parse(file: impl Into<String>, reason: impl Into<String>) -> Self {
        SurveyError::ParseFailure {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

pub type SurveyResult<T> = std::result::Result<T, SurveyError>;
