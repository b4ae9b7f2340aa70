//! Credential persistence — the token pair and client identity live in a
//! flat `KEY=VALUE` file that is rewritten in full after every token
//! refresh, so an interrupted process never loses a newly issued refresh
//! token.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::RunError;

/// OAuth2 access/refresh token pair. Treated as an opaque atomic unit:
/// a refresh replaces both fields at once, never one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Application identity registered with the platform. Immutable for the
/// process lifetime.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: String,
}

/// Everything the store knows at load time.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity: ClientIdentity,
    pub tokens: TokenPair,
}

/// Narrow persistence seam so the token manager can be tested against an
/// in-memory double.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Credentials, RunError>;
    /// Persists a freshly issued pair. Must complete before the run
    /// continues; the caller treats failure as fatal.
    async fn save(&self, tokens: &TokenPair) -> Result<(), RunError>;
}

const KEY_CLIENT_ID: &str = "CLIENT_ID";
const KEY_CLIENT_SECRET: &str = "CLIENT_SECRET";
const KEY_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
const KEY_REFRESH_TOKEN: &str = "REFRESH_TOKEN";

/// Credential store backed by a dotenv-style file.
///
/// `save` rewrites the whole file (truncate-then-write is fine in this
/// single-writer system) but keeps every key it does not own, so notifier
/// settings sharing the same file survive a token rotation.
pub struct EnvFileStore {
    path: PathBuf,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_entries(&self) -> Result<Vec<(String, String)>, RunError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RunError::Credentials(format!("cannot read {}: {e}", self.path.display()))
        })?;
        Ok(parse_entries(&raw))
    }
}

/// Parses `KEY=VALUE` lines, ignoring blanks and `#` comments. Order is
/// preserved so a rewrite keeps the file recognizable.
fn parse_entries(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn require<'a>(
    entries: &'a [(String, String)],
    key: &str,
    path: &std::path::Path,
) -> Result<&'a str, RunError> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            RunError::Credentials(format!("{} is missing or empty in {}", key, path.display()))
        })
}

#[async_trait]
impl CredentialStore for EnvFileStore {
    async fn load(&self) -> Result<Credentials, RunError> {
        let entries = self.read_entries().await?;
        Ok(Credentials {
            identity: ClientIdentity {
                client_id: require(&entries, KEY_CLIENT_ID, &self.path)?.to_string(),
                client_secret: require(&entries, KEY_CLIENT_SECRET, &self.path)?.to_string(),
            },
            tokens: TokenPair {
                access_token: require(&entries, KEY_ACCESS_TOKEN, &self.path)?.to_string(),
                refresh_token: require(&entries, KEY_REFRESH_TOKEN, &self.path)?.to_string(),
            },
        })
    }

    async fn save(&self, tokens: &TokenPair) -> Result<(), RunError> {
        let mut entries = self.read_entries().await?;
        for (key, value) in entries.iter_mut() {
            if key == KEY_ACCESS_TOKEN {
                *value = tokens.access_token.clone();
            } else if key == KEY_REFRESH_TOKEN {
                *value = tokens.refresh_token.clone();
            }
        }

        let mut out = String::new();
        for (key, value) in &entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }

        tokio::fs::write(&self.path, out).await.map_err(|e| {
            RunError::Credentials(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}
