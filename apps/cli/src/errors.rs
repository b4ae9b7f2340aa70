use thiserror::Error;

/// Error taxonomy for one bump run.
///
/// `Transport` on the first listing attempt triggers the single
/// refresh-and-retry cycle; everything else that reaches the top of the
/// run is fatal. Per-resume publish failures are caught at the resume
/// boundary and recorded in the `RunResult` instead of propagating.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("platform returned status {status}: {body}")]
    Auth { status: u16, body: String },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("credential store error: {0}")]
    Credentials(String),

    #[error("notification error: {0}")]
    Notification(String),
}
