//! Alias backend client: wire types and OAuth2 client-credentials auth.
//!
//! The backend maps `(type, functionalId)` pairs to canonical alias UUIDs.
//! Batch dispatch is wired up here but not yet driven by the ingress path —
//! the transformer always answers rewrites locally for now, and any failure
//! on this path must degrade to local derivation rather than fail the
//! request.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AliasError;

/// How long idle backend connections are kept before being reclaimed.
const IDLE_TIMEOUT: StdDuration = StdDuration::from_secs(300);

/// Complete alias backend configuration.
#[derive(Debug, Clone)]
pub struct AliasConfig {
    pub service_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

/// One entry of a batch request to the alias service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasRequest {
    /// Correlation sequence, echoed back by the service.
    #[serde(rename = "_id")]
    pub sequence: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "functionalId")]
    pub functional_id: String,
}

/// The `(type, functionalId)` pair as echoed in a batch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "functionalId")]
    pub functional_id: String,
}

/// One entry of a batch response from the alias service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasResponse {
    #[serde(rename = "_id")]
    pub sequence: String,
    #[serde(rename = "aliasId")]
    pub alias_id: Uuid,
    pub entity: AliasEntry,
    pub status: String,
}

/// Cached bearer token with expiration.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    token_type: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Check if the token is expired or will expire within the buffer.
    ///
    /// Uses a 30-second base buffer plus 0-5s jitter to avoid thundering
    /// herds on refresh.
    fn is_expired(&self) -> bool {
        let jitter = rand::thread_rng().gen_range(0..5);
        let buffer = Duration::seconds(30 + jitter);
        Utc::now() + buffer >= self.expires_at
    }

    fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Client for the alias service with automatic token refresh.
pub struct AliasClient {
    config: AliasConfig,
    http_client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl std::fmt::Debug for AliasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasClient")
            .field("service_url", &self.config.service_url)
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

impl AliasClient {
    pub fn new(config: AliasConfig) -> Result<Self, AliasError> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(IDLE_TIMEOUT)
            .connect_timeout(StdDuration::from_secs(30))
            .timeout(StdDuration::from_secs(60))
            .build()
            .map_err(|e| AliasError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn service_url(&self) -> &str {
        &self.config.service_url
    }

    /// Send one batch and return the service's entries.
    pub async fn send_batch(
        &self,
        batch: &[AliasRequest],
    ) -> Result<Vec<AliasResponse>, AliasError> {
        let token = self.get_token().await?;

        let response = self
            .http_client
            .post(&self.config.service_url)
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .json(batch)
            .send()
            .await
            .map_err(|e| AliasError::Http(format!("batch request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AliasError::Rejected { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| AliasError::Http(format!("failed to parse batch response: {}", e)))
    }

    /// Fetch a new access token from the token endpoint.
    async fn fetch_token(&self) -> Result<CachedToken, AliasError> {
        let scope = self.config.scopes.join(" ");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AliasError::Token(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AliasError::Token(format!(
                "token endpoint answered {}: {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default = "default_token_type")]
            token_type: String,
            expires_in: Option<i64>,
        }

        fn default_token_type() -> String {
            "Bearer".to_string()
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| AliasError::Token(format!("failed to parse token response: {}", e)))?;

        // Default to 1 hour if the endpoint does not say.
        let expires_in = token_resp.expires_in.unwrap_or(3600);
        let expires_at = Utc::now() + Duration::seconds(expires_in);

        tracing::debug!(
            expires_in = expires_in,
            token_type = %token_resp.token_type,
            "alias backend token acquired"
        );

        Ok(CachedToken {
            access_token: token_resp.access_token,
            token_type: token_resp.token_type,
            expires_at,
        })
    }

    /// Get a valid token, refreshing if needed.
    async fn get_token(&self) -> Result<CachedToken, AliasError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        let new_token = self.fetch_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        Ok(new_token)
    }
}
