//! Eligibility policy — pure decision function over one validated resume.

use chrono::{DateTime, FixedOffset};

use crate::errors::RunError;
use crate::models::ResumeSummary;

/// Platform timestamp format for `next_publish_at`, a fixed-offset
/// date-time like `2024-05-01T12:30:00+0300`.
pub const PUBLISH_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// What to do with one resume this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Cooldown has elapsed; republish now.
    PublishNow,
    /// Cooldown still running; nothing to do until the given time.
    WaitUntil(DateTime<FixedOffset>),
    /// Not visible to employers; automation leaves it alone.
    SkipNotVisible,
}

/// Decides publish eligibility. Stateless and re-derived every run.
///
/// A resume that is visible and not yet publishable must carry a parseable
/// `next_publish_at`; anything else means the upstream schema changed, and
/// guessing could trigger an unintended publish, so it is a fatal
/// `Schema` error rather than a skip.
pub fn decide(resume: &ResumeSummary) -> Result<Decision, RunError> {
    if !resume.visible_to_clients {
        return Ok(Decision::SkipNotVisible);
    }
    if resume.can_publish_now {
        return Ok(Decision::PublishNow);
    }

    let raw = resume.next_publish_at.as_deref().ok_or_else(|| {
        RunError::Schema(format!("resume {} is missing next_publish_at", resume.id))
    })?;
    let at = DateTime::parse_from_str(raw, PUBLISH_AT_FORMAT).map_err(|e| {
        RunError::Schema(format!(
            "resume {} has malformed next_publish_at {raw:?}: {e}",
            resume.id
        ))
    })?;
    Ok(Decision::WaitUntil(at))
}
