use std::sync::Arc;

use crate::service::{
    config::ConfigService,
    email::{Mailer, SmtpMailer},
};

pub struct AppState {
    config: Arc<dyn ConfigService>,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: Arc<dyn ConfigService>) -> Arc<Self> {
        let mailer = Arc::new(SmtpMailer::new(config.values().mailer.clone()));
        Self::with_mailer(config, mailer)
    }

    pub fn with_mailer(config: Arc<dyn ConfigService>, mailer: Arc<dyn Mailer>) -> Arc<Self> {
        Arc::new(Self { config, mailer })
    }

    pub fn config(&self) -> &dyn ConfigService {
        self.config.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }
}
