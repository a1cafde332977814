//! SMTP delivery through a STARTTLS relay.

use {
    async_trait::async_trait,
    lettre::{
        AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        message::{Mailbox, header::ContentType},
        transport::smtp::authentication::Credentials,
    },
    operator_config::MailConfig,
    secrecy::ExposeSecret,
    tracing::debug,
};

use crate::{Error, Result, transport::MailSender, types::OutgoingMail};

const DEFAULT_SMTP_PORT: u16 = 587;

/// Split `host[:port]`, falling back to `default_port`.
pub(crate) fn host_port(value: &str, default_port: u16) -> Result<(String, u16)> {
    let value = value.trim();
    let (host, port) = match value.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|e| Error::InvalidServer {
                value: value.to_string(),
                reason: e.to_string(),
            })?;
            (host, port)
        },
        None => (value, default_port),
    };
    if host.is_empty() {
        return Err(Error::InvalidServer {
            value: value.to_string(),
            reason: "empty host".into(),
        });
    }
    Ok((host.to_string(), port))
}

struct Relay {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

/// Sends HTML mail as the configured account.
///
/// A sender built from incomplete settings still constructs; every send then
/// fails with [`Error::NotConfigured`] so the jobs keep running and log it.
pub struct SmtpSender {
    relay: std::result::Result<Relay, &'static str>,
}

impl SmtpSender {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let Some(from) = config.from_header() else {
            return Ok(Self {
                relay: Err("mail.address"),
            });
        };
        let (Some(address), Some(password)) = (&config.address, &config.password) else {
            return Ok(Self {
                relay: Err("mail.password"),
            });
        };
        let Some(server) = &config.smtp_server else {
            return Ok(Self {
                relay: Err("mail.smtp_server"),
            });
        };

        let (host, port) = host_port(server, DEFAULT_SMTP_PORT)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)?
            .port(port)
            .credentials(Credentials::new(
                address.clone(),
                password.expose_secret().clone(),
            ))
            .build();

        Ok(Self {
            relay: Ok(Relay {
                from: from.parse()?,
                transport,
            }),
        })
    }
}

/// Build the wire message for `mail`.
fn build_message(from: Mailbox, mail: &OutgoingMail) -> Result<Message> {
    Ok(Message::builder()
        .from(from)
        .to(mail.to.parse()?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(mail.html_body.clone())?)
}

#[async_trait]
impl MailSender for SmtpSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let relay = self.relay.as_ref().map_err(|field| Error::not_configured(*field))?;
        let message = build_message(relay.from.clone(), mail)?;
        let response = relay.transport.send(message).await?;
        debug!(to = %mail.to, code = %response.code(), "mail accepted by relay");
        Ok(())
    }
}
