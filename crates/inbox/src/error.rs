use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: &'static str },

    #[error("report interval must be positive")]
    NonPositiveInterval,

    #[error(transparent)]
    Store(#[from] operator_store::Error),

    #[error(transparent)]
    Mail(#[from] operator_mail::Error),

    #[error(transparent)]
    Render(#[from] askama::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_duration(input: &str, reason: &'static str) -> Self {
        Self::InvalidDuration {
            input: input.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
