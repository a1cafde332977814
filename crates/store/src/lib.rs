//! Subscriber and digest-log persistence.
//!
//! A subscriber's most recent log entry is the only state the digest job
//! carries between invocations; [`due::is_due`] is the predicate both store
//! implementations agree on.

pub mod due;
pub mod error;
pub mod migrations;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod types;

pub use {
    error::{Error, Result},
    store::SubscriberStore,
    store_memory::InMemoryStore,
    store_sqlite::SqliteStore,
    types::{
        DigestLogEntry, DueSubscriber, NewSubscriber, Subscriber, SubscriberPatch, stored_interval,
    },
};
