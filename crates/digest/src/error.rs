use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] operator_store::Error),

    #[error(transparent)]
    Submissions(#[from] operator_submissions::Error),

    #[error(transparent)]
    Mail(#[from] operator_mail::Error),

    #[error(transparent)]
    Render(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
