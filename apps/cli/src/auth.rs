//! Token lifecycle — the OAuth2 refresh-token grant and the manager that
//! owns the access/refresh pair across one unattended run.
//!
//! Refresh is reactive only: there is no background timer and no expiry
//! prediction, because the platform exposes no expiry at listing time.
//! The run coordinator calls `refresh` after observing a listing failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::RunError;
use crate::store::{CredentialStore, TokenPair};

const TOKEN_PATH: &str = "/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authorization-server seam, mockable in tests.
#[async_trait]
pub trait AuthEndpoint: Send + Sync {
    /// Exchanges a refresh token for a new pair. A non-2xx response is an
    /// `Auth` error; the caller keeps its current pair in that case.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RunError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

/// Real authorization endpoint: form-encoded POST to `<base>/token`.
pub struct HhAuthEndpoint {
    client: reqwest::Client,
    token_url: String,
}

impl HhAuthEndpoint {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            token_url: format!("{base_url}{TOKEN_PATH}"),
        }
    }
}

#[async_trait]
impl AuthEndpoint for HhAuthEndpoint {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RunError> {
        debug!("requesting token refresh");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RunError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(TokenPair {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }
}

/// Owns the token pair. The pair is mutated only by `refresh`, which
/// swaps both fields at once and persists them before returning, so a
/// crash can never leave the store holding a half-rotated pair.
pub struct TokenManager {
    tokens: TokenPair,
    endpoint: Arc<dyn AuthEndpoint>,
    store: Arc<dyn CredentialStore>,
}

impl TokenManager {
    pub fn new(
        tokens: TokenPair,
        endpoint: Arc<dyn AuthEndpoint>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            tokens,
            endpoint,
            store,
        }
    }

    /// Current access token, without network I/O or server-side
    /// validation. Staleness is discovered by the downstream call.
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    /// Runs the refresh grant and persists the new pair. On any failure
    /// the in-memory pair is left untouched, so calling again with an
    /// already-invalid refresh token fails the same deterministic way.
    pub async fn refresh(&mut self) -> Result<(), RunError> {
        let fresh = self.endpoint.refresh(&self.tokens.refresh_token).await?;
        self.store.save(&fresh).await?;
        self.tokens = fresh;
        info!("access token refreshed and persisted");
        Ok(())
    }
}
