//! IAM client for the OAuth2 client-credentials grant.
//!
//! This module exchanges the provider's API client ID and secret for a
//! short-lived bearer token accepted by the CaaS API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::jwt::token_expiry;
use crate::AuthConfig;

/// A token issued by the IAM service.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Bearer token to send to the CaaS API.
    pub access_token: String,
    /// When the token stops being valid, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Form body of a client-credentials token request.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// Raw response from the token endpoint.
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth2 error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the IAM token endpoint.
pub struct IamClient {
    config: AuthConfig,
    client: reqwest::Client,
}

impl IamClient {
    /// Create a new IAM client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the HTTP client cannot be built.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a new IAM client with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: AuthConfig) -> Self {
        Self { config, client }
    }

    /// Request a fresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The credentials are rejected (`InvalidCredentials`)
    /// - Rate limit is exceeded (`RateLimited`)
    /// - The request times out (`Timeout`)
    /// - Network or server error occurs
    pub async fn request_token(&self) -> Result<IssuedToken> {
        let form = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        };

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle the HTTP response and convert to `IssuedToken`.
    async fn handle_response(response: reqwest::Response) -> Result<IssuedToken> {
        let status = response.status();

        if status.is_success() {
            let raw: RawTokenResponse = response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

            let expires_at = match raw.expires_in {
                Some(secs) => {
                    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
                    Utc::now().checked_add_signed(chrono::Duration::seconds(secs))
                }
                // Not every IAM deployment reports expires_in; fall back to the JWT itself.
                None => token_expiry(&raw.access_token).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Could not read token expiry, token will not be cached");
                    None
                }),
            };

            return Ok(IssuedToken {
                access_token: raw.access_token,
                expires_at,
            });
        }

        let body = response.text().await.unwrap_or_default();
        let oauth_error = serde_json::from_str::<OAuthErrorResponse>(&body).ok();

        match (status.as_u16(), oauth_error) {
            (429, _) => Err(AuthError::RateLimited),
            (_, Some(err)) if err.error == "invalid_client" || err.error == "unauthorized_client" => {
                Err(AuthError::InvalidCredentials(
                    err.error_description.unwrap_or(err.error),
                ))
            }
            (401, err) => Err(AuthError::InvalidCredentials(
                err.map_or_else(|| "unauthorized".to_string(), |e| e.error),
            )),
            (code, Some(err)) => Err(AuthError::TokenRequestFailed {
                status: code,
                message: err.error_description.unwrap_or(err.error),
            }),
            (code, None) => Err(AuthError::TokenRequestFailed {
                status: code,
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
            }),
        }
    }
}
