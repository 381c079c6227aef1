use std::{env, sync::Arc, time::Duration};

use thiserror::Error;

use crate::config::{Config, MailerConfig, Secret};

const DEFAULT_HTTP_PORT: u16 = 3333;
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

pub trait ConfigService: Send + Sync {
    fn port(&self) -> u16;
    fn values(&self) -> &Config;
}

pub struct ConfigServiceImpl {
    config: Arc<Config>,
}

impl ConfigServiceImpl {
    fn strip_wrapping_quotes(value: &str) -> &str {
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            let first = bytes[0];
            let last = bytes[value.len() - 1];
            if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                return &value[1..value.len() - 1];
            }
        }
        value
    }

    fn normalize(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = Self::strip_wrapping_quotes(trimmed).trim();
        if normalized.is_empty() {
            None
        } else {
            Some(normalized.to_string())
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let port = vars.u16("PORT")?.unwrap_or(DEFAULT_HTTP_PORT);
        let smtp_host = vars.required("SMTP_SERVER")?;
        let smtp_port = vars.u16("SMTP_PORT")?.unwrap_or(DEFAULT_SMTP_PORT);
        if smtp_port == 0 {
            return Err(ConfigError::Invalid {
                key: "SMTP_PORT",
                value: "0".to_string(),
            });
        }
        let sender_display_name = vars.required("SENDER_NAME")?;
        let sender_address = vars.required("SENDER_EMAIL")?;
        let auth_username = vars.required("SMTP_USERNAME")?;
        let auth_secret = Secret::new(vars.required("SMTP_PASSWORD")?);
        let accept_invalid_certs = vars.bool("SMTP_ACCEPT_INVALID_CERTS", false);
        let timeout = vars.u64("SMTP_TIMEOUT_SECONDS")?.map(Duration::from_secs);
        let contact_recipient = vars
            .nonempty("CONTACT_RECIPIENT")
            .unwrap_or_else(|| sender_address.clone());

        Ok(Self {
            config: Arc::new(Config {
                port,
                contact_recipient,
                mailer: Arc::new(MailerConfig {
                    smtp_host,
                    smtp_port,
                    sender_display_name,
                    sender_address,
                    auth_username,
                    auth_secret,
                    accept_invalid_certs,
                    timeout,
                }),
            }),
        })
    }
}

impl ConfigService for ConfigServiceImpl {
    fn port(&self) -> u16 {
        self.config.port
    }

    fn values(&self) -> &Config {
        &self.config
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn nonempty(&self, key: &str) -> Option<String> {
        (self.lookup)(key).and_then(|value| ConfigServiceImpl::normalize(&value))
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.nonempty(key).ok_or(ConfigError::Missing(key))
    }

    fn u16(&self, key: &'static str) -> Result<Option<u16>, ConfigError> {
        self.parsed(key)
    }

    fn u64(&self, key: &'static str) -> Result<Option<u64>, ConfigError> {
        self.parsed(key)
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.nonempty(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::Invalid { key, value }),
        }
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        self.nonempty(key)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }
}
