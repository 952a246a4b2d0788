use actix_web::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpServer};
use tracing::{info, warn};

use crate::config::{ExchangeConfig, ServerConfig};
use crate::errors::ServerError;
use crate::oauth_handler::{routes, ExchangeState, EXCHANGE_PATH};

/// Permissive CORS headers attached to every response, errors included.
/// The authorization code is the real trust boundary, not the origin.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .add((ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
}

/// HTTP server exposing the code exchange endpoint.
pub struct TwitterAuthServer {
    server_config: ServerConfig,
    state: ExchangeState,
}

impl TwitterAuthServer {
    pub fn new(
        server_config: ServerConfig,
        exchange_config: ExchangeConfig,
    ) -> Result<Self, ServerError> {
        let state = ExchangeState::new(exchange_config)?;
        Ok(Self {
            server_config,
            state,
        })
    }

    /// Serves until the process receives a shutdown signal.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.server_config.bind_addr();
        let credentials = &self.state.config.credentials;
        if !credentials.is_complete() {
            warn!(
                "Provider credentials incomplete (client id: {}, client secret: {}); exchanges will fail until they are set",
                credentials.has_client_id(),
                credentials.has_client_secret()
            );
        }

        info!(
            "Starting twitter auth server on http://{}{}",
            addr, EXCHANGE_PATH
        );

        let state = self.state.clone();
        HttpServer::new(move || {
            App::new()
                .wrap(cors_headers())
                .wrap(Logger::default())
                .configure(routes(state.clone()))
        })
        .bind(addr.as_str())
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?
        .shutdown_timeout(5)
        .run()
        .await?;

        info!("Twitter auth server stopped");
        Ok(())
    }
}
