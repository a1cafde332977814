use crate::job::JobKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} job period must be greater than zero")]
    InvalidPeriod { kind: JobKind },

    #[error("{kind} job is already scheduled")]
    AlreadyScheduled { kind: JobKind },

    #[error("scheduler is already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, Error>;
