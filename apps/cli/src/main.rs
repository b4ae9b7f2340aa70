mod api;
mod auth;
mod cli;
mod config;
mod eligibility;
mod errors;
mod logging;
mod models;
mod notify;
mod run;
mod store;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use crate::api::HhResumeApi;
use crate::auth::{HhAuthEndpoint, TokenManager};
use crate::cli::Cli;
use crate::config::Config;
use crate::eligibility::Decision;
use crate::notify::TelegramNotifier;
use crate::run::{RunCoordinator, RunResult};
use crate::store::{CredentialStore, EnvFileStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Startup failures (missing config, unreadable credential file) are
    // real errors; once a run starts, failures are logged and the
    // process still exits 0 so the external scheduler never flaps.
    let config = Config::from_env()?;
    let _guard = logging::init(cli.print_all, &config.log_dir, &config.rust_log)?;

    info!("Starting resume-up v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn CredentialStore> =
        Arc::new(EnvFileStore::new(config.credentials_file.clone()));
    let credentials = store.load().await?;
    info!(
        "Credentials loaded for client {}",
        credentials.identity.client_id
    );

    let tokens = TokenManager::new(
        credentials.tokens,
        Arc::new(HhAuthEndpoint::new(&config.api_base_url)),
        store,
    );
    let api = Arc::new(HhResumeApi::new(config.api_base_url.clone()));
    let notifier = Arc::new(TelegramNotifier::new(
        &config.telegram_api_url,
        &config.telegram_token,
        config.telegram_chat_id.clone(),
    ));

    let mut coordinator = RunCoordinator::new(tokens, api, notifier, cli.print_all);

    match coordinator.run().await {
        Ok(results) => report(&results),
        Err(err) => error!("run aborted: {err}"),
    }

    Ok(())
}

fn report(results: &[RunResult]) {
    let published = results.iter().filter(|r| r.published).count();
    let waiting = results
        .iter()
        .filter(|r| matches!(r.decision, Decision::WaitUntil(_)))
        .count();
    let skipped = results
        .iter()
        .filter(|r| r.decision == Decision::SkipNotVisible)
        .count();
    let failed = results.iter().filter(|r| r.error.is_some()).count();

    info!(
        "Run finished: {} resumes, {published} published, {waiting} on cooldown, \
         {skipped} not visible, {failed} failed",
        results.len()
    );
}
