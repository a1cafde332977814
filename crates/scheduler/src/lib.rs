//! Fixed-period job runner.

pub mod error;
pub mod job;
pub mod scheduler;

pub use {
    error::{Error, Result},
    job::{BoxError, Job, JobKind},
    scheduler::Scheduler,
};
