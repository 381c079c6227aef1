use async_trait::async_trait;
use lettre::{
    address::Envelope,
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{AsyncSmtpConnection, TlsParameters},
        extension::ClientId,
    },
};
use std::time::Duration;

use crate::config::MailerConfig;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Opens one SMTP session per call. Nothing is pooled.
#[async_trait]
pub trait SmtpConnector: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn SmtpSession>, BoxError>;
}

/// A live SMTP session, already greeted with EHLO.
///
/// Dropping the session closes the socket; `abort` additionally tries a QUIT first.
#[async_trait]
pub trait SmtpSession: Send {
    async fn starttls(&mut self) -> Result<(), BoxError>;
    fn is_encrypted(&self) -> bool;
    async fn authenticate(&mut self, username: &str, secret: &str) -> Result<(), BoxError>;
    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), BoxError>;
    async fn quit(&mut self) -> Result<(), BoxError>;
    async fn abort(&mut self);
}

pub struct LettreConnector {
    hello_name: ClientId,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl LettreConnector {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            hello_name: ClientId::default(),
            timeout: config.timeout,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

#[async_trait]
impl SmtpConnector for LettreConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn SmtpSession>, BoxError> {
        // Plain TCP first; the upgrade happens in `starttls`.
        let conn =
            AsyncSmtpConnection::connect_tokio1((host, port), self.timeout, &self.hello_name, None, None)
                .await?;

        Ok(Box::new(LettreSession {
            conn,
            domain: host.to_string(),
            hello_name: self.hello_name.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }))
    }
}

struct LettreSession {
    conn: AsyncSmtpConnection,
    domain: String,
    hello_name: ClientId,
    accept_invalid_certs: bool,
}

#[async_trait]
impl SmtpSession for LettreSession {
    async fn starttls(&mut self) -> Result<(), BoxError> {
        let params = TlsParameters::builder(self.domain.clone())
            .dangerous_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;
        self.conn.starttls(params, &self.hello_name).await?;
        Ok(())
    }

    fn is_encrypted(&self) -> bool {
        self.conn.is_encrypted()
    }

    async fn authenticate(&mut self, username: &str, secret: &str) -> Result<(), BoxError> {
        let credentials = Credentials::new(username.to_string(), secret.to_string());
        self.conn
            .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .await?;
        Ok(())
    }

    async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), BoxError> {
        self.conn.send(envelope, message).await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BoxError> {
        self.conn.quit().await?;
        Ok(())
    }

    async fn abort(&mut self) {
        self.conn.abort().await;
    }
}
