//! IMAP retrieval of unread messages.

use {
    async_trait::async_trait,
    mailparse::{MailAddr, ParsedMail},
    operator_config::MailConfig,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    smtp::host_port,
    transport::MailFetcher,
    types::InboundMessage,
};

const DEFAULT_IMAP_PORT: u16 = 993;

#[derive(Clone)]
struct Account {
    host: String,
    port: u16,
    user: String,
    password: Secret<String>,
}

/// Reads unread mail over implicit TLS. Each call opens its own session.
pub struct ImapFetcher {
    account: std::result::Result<Account, &'static str>,
}

impl ImapFetcher {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let Some(user) = &config.address else {
            return Ok(Self {
                account: Err("mail.address"),
            });
        };
        let Some(password) = &config.password else {
            return Ok(Self {
                account: Err("mail.password"),
            });
        };
        let Some(server) = &config.imap_server else {
            return Ok(Self {
                account: Err("mail.imap_server"),
            });
        };
        let (host, port) = host_port(server, DEFAULT_IMAP_PORT)?;
        Ok(Self {
            account: Ok(Account {
                host,
                port,
                user: user.clone(),
                password: password.clone(),
            }),
        })
    }
}

#[async_trait]
impl MailFetcher for ImapFetcher {
    async fn fetch_unread(&self, folder: &str) -> Result<Vec<InboundMessage>> {
        let account = self
            .account
            .as_ref()
            .map_err(|field| Error::not_configured(*field))?
            .clone();
        let folder = folder.to_string();
        tokio::task::spawn_blocking(move || fetch_blocking(&account, &folder)).await?
    }
}

fn fetch_blocking(account: &Account, folder: &str) -> Result<Vec<InboundMessage>> {
    let tls = native_tls::TlsConnector::builder().build()?;
    let client = imap::connect(
        (account.host.as_str(), account.port),
        account.host.as_str(),
        &tls,
    )?;
    let mut session = client
        .login(&account.user, account.password.expose_secret())
        .map_err(|(err, _client)| err)?;

    session.select(folder)?;
    let mut unseen: Vec<u32> = session.search("UNSEEN")?.into_iter().collect();
    unseen.sort_unstable();
    debug!(folder, count = unseen.len(), "unread messages");

    let mut messages = Vec::with_capacity(unseen.len());
    if !unseen.is_empty() {
        let set = unseen
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        // A non-peek RFC822 fetch sets \Seen.
        let fetched = session.fetch(set, "RFC822")?;
        for fetch in fetched.iter() {
            let Some(raw) = fetch.body() else {
                continue;
            };
            match parse_message(raw) {
                Ok(message) => messages.push(message),
                Err(e) => warn!(folder, seq = fetch.message, error = %e, "skipping unparsable message"),
            }
        }
    }

    session.logout()?;
    Ok(messages)
}

/// Decode a raw RFC 822 message into the fields intake needs.
pub fn parse_message(raw: &[u8]) -> Result<InboundMessage> {
    let parsed = mailparse::parse_mail(raw)?;
    let subject = parsed
        .headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case("Subject"))
        .map(|h| h.get_value())
        .unwrap_or_default();

    let from_address = match parsed
        .headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case("From"))
    {
        Some(header) => first_address(&mailparse::addrparse_header(header)?),
        None => None,
    }
    .ok_or_else(|| Error::message("message has no From address"))?;

    let text_body = find_plain_text(&parsed)?.unwrap_or_default();

    Ok(InboundMessage {
        from_address,
        subject,
        text_body,
    })
}

fn first_address(list: &[MailAddr]) -> Option<String> {
    list.iter().find_map(|addr| match addr {
        MailAddr::Single(single) => Some(single.addr.clone()),
        MailAddr::Group(group) => group.addrs.first().map(|s| s.addr.clone()),
    })
}

fn find_plain_text(part: &ParsedMail<'_>) -> Result<Option<String>> {
    if part.subparts.is_empty() {
        if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            return Ok(Some(part.get_body()?));
        }
        return Ok(None);
    }
    for sub in &part.subparts {
        if let Some(text) = find_plain_text(sub)? {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_message() {
        let raw = b"From: Reader <reader@example.com>\r\n\
Subject: [op] subscribe\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
github: reader\r\n\
interval: 24h\r\n";
        let message = parse_message(raw).unwrap();
        assert_eq!(message.from_address, "reader@example.com");
        assert_eq!(message.subject, "[op] subscribe");
        assert!(message.text_body.contains("interval: 24h"));
    }

    #[test]
    fn picks_plain_part_of_alternative() {
        let raw = b"From: reader@example.com\r\n\
Subject: [op] update\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"xyz\"\r\n\
\r\n\
--xyz\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>interval: 1h</p>\r\n\
--xyz\r\n\
Content-Type: text/plain\r\n\
\r\n\
interval: 2h\r\n\
--xyz--\r\n";
        let message = parse_message(raw).unwrap();
        assert_eq!(message.text_body.trim(), "interval: 2h");
    }

    #[test]
    fn html_only_message_has_empty_text() {
        let raw = b"From: reader@example.com\r\n\
Subject: hi\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>hello</p>\r\n";
        let message = parse_message(raw).unwrap();
        assert!(message.text_body.is_empty());
    }

    #[test]
    fn missing_from_is_an_error() {
        let raw = b"Subject: [op] subscribe\r\n\r\nbody\r\n";
        assert!(parse_message(raw).is_err());
    }

    #[tokio::test]
    async fn unconfigured_fetcher_reports_missing_field() {
        let fetcher = ImapFetcher::from_config(&MailConfig::default()).unwrap();
        let err = fetcher.fetch_unread("INBOX").await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured {
            field: "mail.address"
        }));
    }
}
