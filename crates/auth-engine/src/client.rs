//! HTTP adapter for the backend auth contract.

use crate::error::{AuthError, AuthResult};
use crate::types::{Account, RegisterRequest, TokenPair};
use serde_json::json;
use std::time::Duration;

/// Fixed connect/receive timeout for every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to the backend base URL.
///
/// Pure transport adapter: JSON content negotiation, fixed timeouts, no
/// retry logic of its own.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client for the given base URL (without the `/api/v1`
    /// path, e.g. `https://api.artel.app`).
    pub fn new(base_url: impl Into<String>) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Exchange credentials for a token pair.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        let url = self.endpoint("/auth/login/");
        tracing::debug!(url = %url, "Requesting login");

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        Self::token_pair_from(response).await
    }

    /// Submit a registration payload; a successful response carries a
    /// token pair like login.
    pub async fn register(&self, payload: &RegisterRequest) -> AuthResult<TokenPair> {
        let url = self.endpoint("/auth/register/");
        tracing::debug!(url = %url, user_type = %payload.user_type, "Requesting registration");

        let response = self.http.post(&url).json(payload).send().await?;

        Self::token_pair_from(response).await
    }

    /// Fetch the authenticated account with its role-specific profile.
    pub async fn me(&self, access_token: &str) -> AuthResult<Account> {
        let url = self.endpoint("/auth/me/");
        tracing::debug!(url = %url, "Fetching profile");

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        Account::from_me_body(body)
    }

    async fn token_pair_from(response: reqwest::Response) -> AuthResult<TokenPair> {
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let pair: TokenPair = response.json().await?;
        pair.validate()
    }

    async fn rejection(response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Backend rejected auth request");

        if status.is_client_error() {
            AuthError::from_rejection(status, &body)
        } else {
            AuthError::Network(format!("server error (HTTP {})", status.as_u16()))
        }
    }
}
