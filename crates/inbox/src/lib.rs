//! Subscription intake: turns `[op] ...` emails into subscriber changes and
//! confirms each change back to the reader.

pub mod body;
pub mod command;
pub mod duration;
pub mod error;
pub mod intake;
pub mod render;

pub use {
    body::{ReaderInfo, parse_body},
    command::{Command, classify},
    duration::{format_interval, parse_duration},
    error::{Error, Result},
    intake::{IntakeJob, IntakeSummary},
};
