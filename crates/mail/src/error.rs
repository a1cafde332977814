use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("mail is not configured: {field} is missing")]
    NotConfigured { field: &'static str },

    #[error("invalid server address {value:?}: {reason}")]
    InvalidServer { value: String, reason: String },

    #[error(transparent)]
    Address(#[from] lettre::address::AddressError),

    #[error(transparent)]
    Build(#[from] lettre::error::Error),

    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error(transparent)]
    Imap(#[from] imap::Error),

    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    #[error(transparent)]
    Parse(#[from] mailparse::MailParseError),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_configured(field: &'static str) -> Self {
        Self::NotConfigured { field }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
