use std::fmt;
use std::sync::Arc;

use actix_web::http::{header::CONTENT_TYPE, Method};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ExchangeConfig;
use crate::errors::ExchangeError;
use crate::provider::TwitterProvider;

/// Route serving the code exchange.
pub const EXCHANGE_PATH: &str = "/api/twitter-auth";

/// Shared state for the exchange handlers. Read-only after startup.
#[derive(Clone)]
pub struct ExchangeState {
    pub config: Arc<ExchangeConfig>,
    pub provider: Arc<TwitterProvider>,
}

impl ExchangeState {
    pub fn new(config: ExchangeConfig) -> Result<Self, reqwest::Error> {
        let provider = TwitterProvider::new(config.endpoints.clone())?;
        Ok(Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
        })
    }
}

/// Exchange parameters as sent by the browser, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct ExchangeParams {
    pub code: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
}

impl ExchangeParams {
    /// Parses a JSON or form-encoded body. Anything unreadable yields empty
    /// params, which then fail validation.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }

        let is_form = content_type.map(is_form_content_type).unwrap_or(false);

        let parsed = if is_form {
            serde_urlencoded::from_bytes(body).map_err(|e| e.to_string())
        } else {
            serde_json::from_slice(body).map_err(|e| e.to_string())
        };

        parsed.unwrap_or_else(|err| {
            debug!("Unreadable exchange body: {}", err);
            Self::default()
        })
    }

    pub fn validate(self) -> Result<ExchangeRequest, ExchangeError> {
        match (
            present(self.code),
            present(self.code_verifier),
            present(self.redirect_uri),
        ) {
            (Some(code), Some(code_verifier), Some(redirect_uri)) => Ok(ExchangeRequest {
                code,
                code_verifier,
                redirect_uri,
            }),
            _ => Err(ExchangeError::MissingParameters),
        }
    }
}

/// Media types compare case-insensitively; parameters after `;` are ignored.
fn is_form_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A validated exchange request. All fields are non-empty.
#[derive(Clone)]
pub struct ExchangeRequest {
    pub code: String,
    pub code_verifier: String,
    pub redirect_uri: String,
}

impl fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("code", &"[REDACTED]")
            .field("code_verifier", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Exchange an authorization code for the user's identity
/// POST /api/twitter-auth
pub async fn handle_exchange(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    state: web::Data<ExchangeState>,
) -> Result<HttpResponse, ExchangeError> {
    let body = body.map_err(|e| ExchangeError::Internal(format!("Failed to read body: {}", e)))?;
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let request = ExchangeParams::from_body(content_type, &body).validate()?;
    info!("Exchanging authorization code for {}", request.redirect_uri);

    let user = state
        .provider
        .exchange(&state.config.credentials, &request)
        .await?;

    info!("Authenticated user {} (@{})", user.id, user.username);
    Ok(HttpResponse::Ok().json(user))
}

/// CORS pre-flight. Always succeeds with an empty body.
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed(req: HttpRequest) -> Result<HttpResponse, ExchangeError> {
    debug!("Rejecting {} {}", req.method(), req.path());
    Err(ExchangeError::MethodNotAllowed)
}

/// Health check for the auth server
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Auth server OK")
}

/// Registers state and routes. Usable from `App::configure` in the server and
/// in tests.
pub fn routes(state: ExchangeState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state))
            .route("/health", web::get().to(health_check))
            .service(
                web::resource(EXCHANGE_PATH)
                    .route(web::post().to(handle_exchange))
                    .route(web::method(Method::OPTIONS).to(preflight))
                    .default_service(web::to(method_not_allowed)),
            );
    }
}
