use async_trait::async_trait;

use crate::{
    Result,
    types::{InboundMessage, OutgoingMail},
};

/// Outbound delivery.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Inbound retrieval. Returned messages are marked read on the server.
#[async_trait]
pub trait MailFetcher: Send + Sync {
    async fn fetch_unread(&self, folder: &str) -> Result<Vec<InboundMessage>>;
}
