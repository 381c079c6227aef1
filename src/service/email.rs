use async_trait::async_trait;
use lettre::{
    address::AddressError,
    message::{header, Mailbox, Message, MultiPart, SinglePart},
    Address,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    config::MailerConfig,
    service::smtp::{BoxError, LettreConnector, SmtpConnector, SmtpSession},
};

const SUBJECT_PREFIX: &str = "[Contact Form] ";

#[derive(Clone, Debug)]
pub struct ContactSubmission {
    pub recipient_address: String,
    pub subject: String,
    pub submitter_name: String,
    pub submitter_address: String,
    pub body: String,
}

/// Every way a contact email can fail to go out.
#[derive(Debug, Error)]
pub enum MailDeliveryError {
    #[error("invalid {role} address {value:?}: {source}")]
    Address {
        role: &'static str,
        value: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("failed to connect to {server}:{port}: {source}")]
    Connect {
        server: String,
        port: u16,
        #[source]
        source: BoxError,
    },
    #[error("STARTTLS negotiation failed: {0}")]
    Tls(#[source] BoxError),
    #[error("authentication failed: {0}")]
    Auth(#[source] BoxError),
    #[error("transmission failed: {0}")]
    Send(#[source] BoxError),
    #[error("disconnect failed: {0}")]
    Disconnect(#[source] BoxError),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// One delivery attempt; the error carries the cause.
    async fn deliver(&self, submission: &ContactSubmission) -> Result<(), MailDeliveryError>;

    /// Same as [`Mailer::deliver`], collapsed to a success flag.
    async fn send(&self, submission: &ContactSubmission) -> bool {
        self.deliver(submission).await.is_ok()
    }
}

pub struct SmtpMailer {
    config: Arc<MailerConfig>,
    connector: Arc<dyn SmtpConnector>,
}

impl SmtpMailer {
    pub fn new(config: Arc<MailerConfig>) -> Self {
        let connector = Arc::new(LettreConnector::new(&config));
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: Arc<MailerConfig>, connector: Arc<dyn SmtpConnector>) -> Self {
        info!(sender = %config.sender_address, "email service initialised");
        Self { config, connector }
    }

    async fn transmit(&self, message: &Message) -> Result<(), MailDeliveryError> {
        let server = self.config.smtp_host.as_str();
        let port = self.config.smtp_port;

        info!(server, port, "connecting to smtp server");
        let mut session = self
            .connector
            .connect(server, port)
            .await
            .map_err(|source| MailDeliveryError::Connect {
                server: server.to_string(),
                port,
                source,
            })?;

        let result = self.run_session(session.as_mut(), message).await;
        if result.is_err() {
            session.abort().await;
        }
        result
    }

    async fn run_session(
        &self,
        session: &mut dyn SmtpSession,
        message: &Message,
    ) -> Result<(), MailDeliveryError> {
        session.starttls().await.map_err(MailDeliveryError::Tls)?;
        if !session.is_encrypted() {
            return Err(MailDeliveryError::Tls(
                "connection is still unencrypted after STARTTLS".into(),
            ));
        }

        info!(username = %self.config.auth_username, "authenticating with smtp server");
        session
            .authenticate(&self.config.auth_username, self.config.auth_secret.expose())
            .await
            .map_err(MailDeliveryError::Auth)?;

        let raw = message.formatted();
        session
            .send(message.envelope(), &raw)
            .await
            .map_err(MailDeliveryError::Send)?;

        session.quit().await.map_err(MailDeliveryError::Disconnect)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, submission: &ContactSubmission) -> Result<(), MailDeliveryError> {
        let recipient = submission.recipient_address.as_str();
        info!(recipient, subject = %submission.subject, "starting email send");

        let result = match build_message(&self.config, submission) {
            Ok(message) => self.transmit(&message).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(()) => info!(recipient, "email sent successfully"),
            Err(err) => error!(recipient, error = %err, "failed to send email"),
        }
        result
    }
}

fn parse_address(role: &'static str, value: &str) -> Result<Address, MailDeliveryError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|source| MailDeliveryError::Address {
            role,
            value: value.to_string(),
            source,
        })
}

fn display_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub fn build_message(
    config: &MailerConfig,
    submission: &ContactSubmission,
) -> Result<Message, MailDeliveryError> {
    let from = Mailbox::new(
        display_name(&config.sender_display_name),
        parse_address("sender", &config.sender_address)?,
    );
    let to = Mailbox::new(None, parse_address("recipient", &submission.recipient_address)?);
    let reply_to = Mailbox::new(
        display_name(&submission.submitter_name),
        parse_address("reply-to", &submission.submitter_address)?,
    );

    let body = MultiPart::alternative()
        .singlepart(
            SinglePart::builder()
                .header(header::ContentType::TEXT_PLAIN)
                .body(render_text_body(submission)),
        )
        .singlepart(
            SinglePart::builder()
                .header(header::ContentType::TEXT_HTML)
                .body(render_html_body(submission)),
        );

    let message = Message::builder()
        .from(from)
        .to(to)
        .reply_to(reply_to)
        .subject(format!("{SUBJECT_PREFIX}{}", submission.subject))
        .multipart(body)?;

    Ok(message)
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_html_body(submission: &ContactSubmission) -> String {
    let message = escape_html(&submission.body).replace('\n', "<br/>");
    format!(
        concat!(
            "<h3>New Contact Form Submission</h3>\n",
            "<hr/>\n",
            "<p><strong>From:</strong> {name}</p>\n",
            "<p><strong>Email:</strong> {email}</p>\n",
            "<p><strong>Subject:</strong> {subject}</p>\n",
            "<hr/>\n",
            "<p><strong>Message:</strong></p>\n",
            "<p>{message}</p>\n",
            "<hr/>\n",
            "<p><small>This email was sent from your website contact form.</small></p>\n"
        ),
        name = escape_html(&submission.submitter_name),
        email = escape_html(&submission.submitter_address),
        subject = escape_html(&submission.subject),
        message = message,
    )
}

pub fn render_text_body(submission: &ContactSubmission) -> String {
    format!(
        concat!(
            "New Contact Form Submission\n",
            "----------------------------\n",
            "From: {name}\n",
            "Email: {email}\n",
            "Subject: {subject}\n",
            "----------------------------\n",
            "Message:\n",
            "{message}\n",
            "----------------------------\n",
            "This email was sent from your website contact form.\n"
        ),
        name = submission.submitter_name,
        email = submission.submitter_address,
        subject = submission.subject,
        message = submission.body,
    )
}
