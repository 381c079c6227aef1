use std::{fmt, sync::Arc, time::Duration};

/// Credential value that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Clone, Debug)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_display_name: String,
    pub sender_address: String,
    pub auth_username: String,
    pub auth_secret: Secret,

    // Local relays (Mailpit and friends) tend to run with self-signed certificates.
    // The session is still upgraded with STARTTLS either way.
    pub accept_invalid_certs: bool,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub contact_recipient: String,
    pub mailer: Arc<MailerConfig>,
}
