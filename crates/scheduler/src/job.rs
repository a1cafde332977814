use async_trait::async_trait;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which job a registration is. One registration per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Digest,
    Intake,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Digest => write!(f, "digest"),
            Self::Intake => write!(f, "intake"),
        }
    }
}

/// A unit of periodic work. Holds no state between ticks beyond what it reads
/// from storage.
#[async_trait]
pub trait Job: Send + Sync {
    fn kind(&self) -> JobKind;

    /// Run one tick. An error is logged; the next tick runs as usual.
    async fn execute(&self) -> Result<(), BoxError>;
}
