//! Interval-based email digests of submission activity.

pub mod clock;
pub mod engine;
pub mod error;
pub mod render;

pub use {
    clock::{Clock, FixedClock, SystemClock},
    engine::{DIGEST_SUBJECT, DigestJob, TickSummary, select_updates},
    error::{Error, Result},
    render::{render_digest, render_report},
};
