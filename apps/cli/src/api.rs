//! Resume API client — the two platform calls the bumper needs: list my
//! resumes, publish one resume. Authorization is a bearer token supplied
//! by the token manager on every call; this client holds no credentials.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::RunError;

const MINE_PATH: &str = "/resumes/mine";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The platform differentiates automated clients on the listing call, so
/// it gets a browser-like user agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Platform seam, mockable in tests. The run coordinator treats any
/// `list` failure on the first attempt as a possible stale token.
#[async_trait]
pub trait ResumeApi: Send + Sync {
    /// Fetches the raw listing payload. Kept as `Value` so the
    /// diagnostic mode can print it verbatim before validation.
    async fn list(&self, access_token: &str) -> Result<Value, RunError>;

    /// Republishes one resume. The platform signals success with
    /// 204 No Content only.
    async fn publish(&self, resume_id: &str, access_token: &str) -> Result<(), RunError>;
}

pub struct HhResumeApi {
    client: reqwest::Client,
    base_url: String,
}

impl HhResumeApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ResumeApi for HhResumeApi {
    async fn list(&self, access_token: &str) -> Result<Value, RunError> {
        debug!("listing resumes");
        let response = self
            .client
            .get(format!("{}{MINE_PATH}", self.base_url))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
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

        Ok(response.json().await?)
    }

    async fn publish(&self, resume_id: &str, access_token: &str) -> Result<(), RunError> {
        debug!(resume_id, "publishing resume");
        let response = self
            .client
            .post(format!("{}/resumes/{resume_id}/publish", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(RunError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
