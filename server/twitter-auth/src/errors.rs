use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Coarse classification of [`ExchangeError`], used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    ServerConfig,
    Upstream,
    Internal,
}

/// Every way an exchange request can fail.
///
/// Upstream variants carry the provider's error body so operators can see why
/// the provider refused. `Internal` never exposes its message to the caller.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Server misconfigured")]
    ServerMisconfigured,

    #[error("Token exchange failed: {0}")]
    TokenExchange(Value),

    #[error("Failed to get user info: {0}")]
    UserInfo(Value),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::MethodNotAllowed | ExchangeError::MissingParameters => {
                ErrorKind::ClientInput
            }
            ExchangeError::ServerMisconfigured => ErrorKind::ServerConfig,
            ExchangeError::TokenExchange(_) | ExchangeError::UserInfo(_) => ErrorKind::Upstream,
            ExchangeError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message sent to the caller in the `error` field.
    pub fn public_message(&self) -> &'static str {
        match self {
            ExchangeError::MethodNotAllowed => "Method not allowed",
            ExchangeError::MissingParameters => "Missing required parameters",
            ExchangeError::ServerMisconfigured => "Server misconfigured",
            ExchangeError::TokenExchange(_) => "Token exchange failed",
            ExchangeError::UserInfo(_) => "Failed to get user info",
            ExchangeError::Internal(_) => "Internal server error",
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            ExchangeError::TokenExchange(details) | ExchangeError::UserInfo(details) => {
                Some(details)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        ExchangeError::Internal(format!("Provider request failed: {}", err))
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::Internal(format!("Malformed provider response: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl ResponseError for ExchangeError {
    fn status_code(&self) -> StatusCode {
        match self {
            ExchangeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ExchangeError::MissingParameters
            | ExchangeError::TokenExchange(_)
            | ExchangeError::UserInfo(_) => StatusCode::BAD_REQUEST,
            ExchangeError::ServerMisconfigured | ExchangeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.kind() {
            ErrorKind::ServerConfig | ErrorKind::Internal => error!("{}", self),
            ErrorKind::ClientInput | ErrorKind::Upstream => warn!("{}", self),
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.public_message(),
            details: self.details(),
        })
    }
}

/// Wraps a provider error body for the `details` field: JSON stays JSON,
/// anything else is passed through as a string.
pub fn error_details(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Failures that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::json;

    async fn body_of(err: ExchangeError) -> (StatusCode, Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_rt::test]
    async fn client_errors_map_to_4xx() {
        let (status, body) = body_of(ExchangeError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method not allowed" }));

        let (status, body) = body_of(ExchangeError::MissingParameters).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required parameters" }));
    }

    #[actix_rt::test]
    async fn upstream_errors_carry_details() {
        let details = json!({ "error": "invalid_request" });
        let (status, body) = body_of(ExchangeError::TokenExchange(details.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Token exchange failed", "details": details })
        );

        let (status, body) = body_of(ExchangeError::UserInfo(json!("Unauthorized"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Failed to get user info", "details": "Unauthorized" })
        );
    }

    #[actix_rt::test]
    async fn server_errors_hide_internals() {
        let (status, body) = body_of(ExchangeError::ServerMisconfigured).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Server misconfigured" }));

        let (status, body) =
            body_of(ExchangeError::Internal("connection reset by peer".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[test]
    fn error_details_keeps_json_and_text() {
        assert_eq!(
            error_details(r#"{"error":"invalid_grant"}"#),
            json!({ "error": "invalid_grant" })
        );
        assert_eq!(error_details("Bad Gateway"), json!("Bad Gateway"));
    }
}
