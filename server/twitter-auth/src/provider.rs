use std::collections::HashMap;

use reqwest::{header::CONTENT_TYPE, redirect, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ProviderCredentials, ProviderEndpoints};
use crate::errors::{error_details, ExchangeError};
use crate::oauth_handler::ExchangeRequest;

/// Minimal identity returned to the browser. Nothing else from the profile
/// is forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub username: String,
    pub name: String,
}

/// `GET /2/users/me` wraps the user in `data`; a bare object is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Wrapped { data: UserIdentity },
    Bare(UserIdentity),
}

impl ProfileResponse {
    fn into_identity(self) -> UserIdentity {
        match self {
            ProfileResponse::Wrapped { data } => data,
            ProfileResponse::Bare(user) => user,
        }
    }
}

/// OAuth2 token response structure
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Client for the two provider calls of the authorization code flow.
#[derive(Debug, Clone)]
pub struct TwitterProvider {
    endpoints: ProviderEndpoints,
    http_client: Client,
}

impl TwitterProvider {
    /// Idle connections are not kept between requests.
    pub fn new(endpoints: ProviderEndpoints) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            endpoints,
            http_client,
        })
    }

    /// Exchanges the code and returns only the identity. The access token is
    /// dropped once the profile call returns.
    pub async fn exchange(
        &self,
        credentials: &ProviderCredentials,
        request: &ExchangeRequest,
    ) -> Result<UserIdentity, ExchangeError> {
        let (client_id, client_secret) = credentials.resolve()?;
        let access_token = self.exchange_code(client_id, client_secret, request).await?;
        self.fetch_user(&access_token).await
    }

    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        request: &ExchangeRequest,
    ) -> Result<SecretString, ExchangeError> {
        let form_data = [
            ("grant_type", "authorization_code"),
            ("code", request.code.as_str()),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("code_verifier", request.code_verifier.as_str()),
        ];

        let response = self
            .http_client
            .post(self.endpoints.token_url.clone())
            .basic_auth(client_id, Some(client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&form_data)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(
                "Token request failed with status {}: {}",
                status, response_text
            );
            return Err(ExchangeError::TokenExchange(error_details(&response_text)));
        }

        let token_response = parse_token_response(&response_text)?;
        debug!(
            token_type = ?token_response.token_type,
            expires_in = ?token_response.expires_in,
            scope = ?token_response.scope,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Received access token"
        );

        Ok(SecretString::from(token_response.access_token))
    }

    pub async fn fetch_user(
        &self,
        access_token: &SecretString,
    ) -> Result<UserIdentity, ExchangeError> {
        let response = self
            .http_client
            .get(self.endpoints.user_url.clone())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(
                "User info request failed with status {}: {}",
                status, response_text
            );
            return Err(ExchangeError::UserInfo(error_details(&response_text)));
        }

        parse_profile(&response_text)
    }
}

/// Tries JSON first, then form data.
fn parse_token_response(body: &str) -> Result<TokenResponse, ExchangeError> {
    if let Ok(token_response) = serde_json::from_str(body) {
        return Ok(token_response);
    }

    let parsed: HashMap<String, String> = serde_urlencoded::from_str(body).map_err(|e| {
        ExchangeError::Internal(format!("Failed to parse token response: {}", e))
    })?;

    Ok(TokenResponse {
        access_token: parsed
            .get("access_token")
            .ok_or_else(|| ExchangeError::Internal("Missing access_token".to_string()))?
            .clone(),
        token_type: parsed.get("token_type").cloned(),
        expires_in: parsed.get("expires_in").and_then(|s| s.parse().ok()),
        refresh_token: parsed.get("refresh_token").cloned(),
        scope: parsed.get("scope").cloned(),
    })
}

fn parse_profile(body: &str) -> Result<UserIdentity, ExchangeError> {
    let profile: ProfileResponse = serde_json::from_str(body)?;
    Ok(profile.into_identity())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_from_json() {
        let token = parse_token_response(
            r#"{"token_type":"bearer","expires_in":7200,"access_token":"abc","scope":"users.read tweet.read"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, Some(7200));
        assert_eq!(token.scope.as_deref(), Some("users.read tweet.read"));
    }

    #[test]
    fn token_response_from_form_data() {
        let token =
            parse_token_response("access_token=abc&token_type=bearer&expires_in=60").unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.token_type.as_deref(), Some("bearer"));
        assert_eq!(token.expires_in, Some(60));
    }

    #[test]
    fn token_response_without_access_token_is_internal() {
        let err = parse_token_response(r#"{"token_type":"bearer"}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::Internal(_)));
    }

    #[test]
    fn profile_keeps_only_identity_fields() {
        let user = parse_profile(
            r#"{"data":{"id":"123","name":"Alice A","username":"alice","verified":true,"profile_image_url":"https://example.com/a.png"}}"#,
        )
        .unwrap();
        assert_eq!(
            user,
            UserIdentity {
                id: "123".to_string(),
                username: "alice".to_string(),
                name: "Alice A".to_string(),
            }
        );
    }

    #[test]
    fn profile_without_envelope() {
        let user = parse_profile(r#"{"id":"9","username":"bob","name":"Bob"}"#).unwrap();
        assert_eq!(user.username, "bob");
    }

    #[test]
    fn malformed_profile_is_internal() {
        let err = parse_profile(r#"{"data":{"id":"123"}}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::Internal(_)));
    }
}
