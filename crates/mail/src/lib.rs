//! Mail primitives: sending digests and confirmations over SMTP, reading
//! subscription requests over IMAP, and sanitizing inbound free text.

pub mod error;
pub mod fetch;
pub mod memory;
pub mod sanitize;
pub mod smtp;
pub mod transport;
pub mod types;

pub use {
    error::{Error, Result},
    fetch::ImapFetcher,
    memory::{MemoryMailbox, MemoryOutbox},
    sanitize::{HtmlSanitizer, Sanitizer},
    smtp::SmtpSender,
    transport::{MailFetcher, MailSender},
    types::{InboundMessage, OutgoingMail},
};
