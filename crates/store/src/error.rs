use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("subscriber not found: {email}")]
    SubscriberNotFound { email: String },

    #[error("subscriber already exists: {email}")]
    SubscriberExists { email: String },

    #[error("report interval must be positive")]
    NonPositiveInterval,

    #[error("log entry for subscriber {subscriber_id} is older than its latest entry")]
    LogOutOfOrder { subscriber_id: i64 },

    #[error("duplicate migration number {number:03}: {first} and {second}")]
    DuplicateMigration {
        number: u16,
        first: String,
        second: String,
    },

    #[error("migration {name} failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },

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
    pub fn subscriber_not_found(email: impl Into<String>) -> Self {
        Self::SubscriberNotFound {
            email: email.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
