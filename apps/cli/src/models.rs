//! Wire-format models for the resume listing payload.
//!
//! The platform schema is loosely specified, so every leaf field is
//! optional and a single validation pass (`ResumeSummary::from_item`)
//! decides what is a schema error versus a legitimate absence. Nothing
//! downstream touches raw JSON.

use serde::Deserialize;

use crate::errors::RunError;

/// Access type id that marks a resume as visible to employers and thus
/// eligible for automated bumping.
pub const CLIENTS_ACCESS_TYPE: &str = "clients";

/// Top-level listing payload. A response without `items` is a fatal
/// schema error, surfaced by the deserialization call site.
#[derive(Debug, Deserialize)]
pub struct ResumeList {
    pub items: Vec<ResumeItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumeItem {
    pub id: Option<String>,
    pub title: Option<String>,
    pub access: Option<Access>,
    pub can_publish_or_update: Option<bool>,
    pub next_publish_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Access {
    #[serde(rename = "type")]
    pub kind: Option<AccessType>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessType {
    pub id: Option<String>,
}

/// One resume after boundary validation. Lives for a single run pass.
#[derive(Debug, Clone)]
pub struct ResumeSummary {
    pub id: String,
    pub title: String,
    pub visible_to_clients: bool,
    pub can_publish_now: bool,
    /// Raw platform timestamp; parsed only when an eligibility decision
    /// actually needs it.
    pub next_publish_at: Option<String>,
}

impl ResumeSummary {
    /// Validates one listing item. Missing `id` or `title` means the
    /// upstream schema changed and is fatal; a missing or non-"clients"
    /// access type just makes the resume invisible to automation.
    pub fn from_item(item: ResumeItem) -> Result<Self, RunError> {
        let id = item
            .id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RunError::Schema("resume item is missing id".to_string()))?;
        let title = item
            .title
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RunError::Schema(format!("resume {id} is missing title")))?;

        let visible_to_clients = item
            .access
            .and_then(|a| a.kind)
            .and_then(|t| t.id)
            .map(|v| v == CLIENTS_ACCESS_TYPE)
            .unwrap_or(false);

        Ok(Self {
            id,
            title,
            visible_to_clients,
            can_publish_now: item.can_publish_or_update.unwrap_or(false),
            next_publish_at: item.next_publish_at,
        })
    }
}
