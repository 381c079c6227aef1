mod config;
mod handler;
mod openapi;
mod service;
mod state;

use std::sync::Arc;

use axum::Router;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    openapi::ApiDoc,
    service::config::{ConfigService, ConfigServiceImpl},
    state::AppState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config: Arc<dyn ConfigService> = match ConfigServiceImpl::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!(error = %err, "invalid email configuration");
            std::process::exit(1);
        }
    };
    let state = AppState::new(config.clone());

    let app = Router::new()
        .merge(handler::health::routes())
        .merge(handler::contact::routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let bind_addr = format!("0.0.0.0:{}", config.port());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("failed to bind to {}", bind_addr));
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .await
        .expect("server error");
}
