/// A message to deliver. The From header comes from the sender's config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingMail {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
        }
    }
}

/// An unread message pulled from a mailbox folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Bare address of the first From mailbox, without display name.
    pub from_address: String,
    pub subject: String,
    /// The first `text/plain` part, or empty when there is none.
    pub text_body: String,
}
