use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no {what} in the submission diff")]
    NotFound { what: &'static str },

    #[error("submission has no {side} branch information")]
    MissingBranchInfo { side: &'static str },

    #[error("malformed diff at line {line}: {message}")]
    Diff { line: usize, message: String },

    #[error("could not decode metadata: {message}")]
    Decode { message: String },

    #[error("package archive has no metadata entry")]
    MissingEntry,

    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

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
    pub fn decode(message: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
