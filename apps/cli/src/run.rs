//! Run coordinator — one pass over the account's resumes.
//!
//! `Start → TokenValid → Listed → {per-resume}* → Done`, with a single
//! alternate edge: if the first listing attempt fails for any reason the
//! coordinator refreshes the token once and retries the listing once.
//! A refresh failure or a second listing failure aborts the run; there is
//! no further retry, to avoid hammering a rate-limited third-party API.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::ResumeApi;
use crate::auth::TokenManager;
use crate::eligibility::{decide, Decision};
use crate::errors::RunError;
use crate::models::{ResumeList, ResumeSummary};
use crate::notify::Notifier;

/// Outcome for one resume, aggregated for reporting and discarded at the
/// end of the run.
#[derive(Debug)]
pub struct RunResult {
    pub resume_id: String,
    pub title: String,
    pub decision: Decision,
    pub published: bool,
    pub notified: bool,
    pub error: Option<String>,
}

pub struct RunCoordinator {
    tokens: TokenManager,
    api: Arc<dyn ResumeApi>,
    notifier: Arc<dyn Notifier>,
    /// Diagnostic mode: print the raw listing payload to stdout.
    print_all: bool,
}

impl RunCoordinator {
    pub fn new(
        tokens: TokenManager,
        api: Arc<dyn ResumeApi>,
        notifier: Arc<dyn Notifier>,
        print_all: bool,
    ) -> Self {
        Self {
            tokens,
            api,
            notifier,
            print_all,
        }
    }

    /// Executes one pass. Fatal errors (auth, schema, post-retry
    /// transport) abort immediately; per-resume publish failures are
    /// recorded and the loop continues.
    pub async fn run(&mut self) -> Result<Vec<RunResult>, RunError> {
        let listing = self.list_with_refresh().await?;

        if self.print_all {
            let pretty = serde_json::to_string_pretty(&listing)
                .map_err(|e| RunError::Schema(format!("cannot render listing: {e}")))?;
            println!("{pretty}");
        }

        let list: ResumeList = serde_json::from_value(listing)
            .map_err(|e| RunError::Schema(format!("unexpected listing shape: {e}")))?;

        let mut results = Vec::with_capacity(list.items.len());
        for item in list.items {
            let resume = ResumeSummary::from_item(item)?;
            let decision = decide(&resume)?;
            results.push(self.act(resume, decision).await);
        }
        Ok(results)
    }

    /// The first listing attempt may fail because the access token went
    /// stale; the platform does not reliably distinguish that from a
    /// network error, so any failure spends the single refresh-and-retry
    /// budget.
    async fn list_with_refresh(&mut self) -> Result<serde_json::Value, RunError> {
        match self.api.list(self.tokens.access_token()).await {
            Ok(listing) => Ok(listing),
            Err(first) => {
                warn!("listing failed ({first}); refreshing token and retrying once");
                self.tokens.refresh().await?;
                self.api.list(self.tokens.access_token()).await
            }
        }
    }

    async fn act(&self, resume: ResumeSummary, decision: Decision) -> RunResult {
        let mut result = RunResult {
            resume_id: resume.id.clone(),
            title: resume.title.clone(),
            decision,
            published: false,
            notified: false,
            error: None,
        };

        match decision {
            Decision::PublishNow => {
                match self.api.publish(&resume.id, self.tokens.access_token()).await {
                    Ok(()) => {
                        info!(resume_id = %resume.id, "resume republished: {}", resume.title);
                        result.published = true;
                        result.notified = self.notify_published(&resume.title).await;
                    }
                    Err(err) => {
                        // One resume's failure must not block the rest.
                        error!(resume_id = %resume.id, "publish failed: {err}");
                        result.error = Some(err.to_string());
                    }
                }
            }
            Decision::WaitUntil(at) => {
                info!(
                    "{} can publish again at {}",
                    resume.title,
                    at.format("%d.%m.%Y %H:%M")
                );
            }
            Decision::SkipNotVisible => {
                info!("{}: not visible to clients, skipping", resume.title);
            }
        }

        result
    }

    /// Publish already happened; a lost notification is only worth a
    /// warning.
    async fn notify_published(&self, title: &str) -> bool {
        let message = format!("Resume republished: {title}");
        match self.notifier.send(&message).await {
            Ok(()) => true,
            Err(err) => {
                warn!("notification failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthEndpoint;
    use crate::store::{CredentialStore, Credentials, TokenPair};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedApi {
        list_responses: Mutex<VecDeque<Result<Value, RunError>>>,
        list_calls: Mutex<Vec<String>>,
        /// Resume ids whose publish call should fail.
        failing_publishes: Vec<String>,
        publish_calls: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(list_responses: Vec<Result<Value, RunError>>) -> Self {
            Self {
                list_responses: Mutex::new(list_responses.into()),
                list_calls: Mutex::new(Vec::new()),
                failing_publishes: Vec::new(),
                publish_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_publish(mut self, resume_id: &str) -> Self {
            self.failing_publishes.push(resume_id.to_string());
            self
        }
    }

    #[async_trait]
    impl ResumeApi for ScriptedApi {
        async fn list(&self, access_token: &str) -> Result<Value, RunError> {
            self.list_calls.lock().unwrap().push(access_token.to_string());
            self.list_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected list call"))
        }

        async fn publish(&self, resume_id: &str, _access_token: &str) -> Result<(), RunError> {
            self.publish_calls.lock().unwrap().push(resume_id.to_string());
            if self.failing_publishes.iter().any(|id| id == resume_id) {
                return Err(RunError::Auth {
                    status: 429,
                    body: "too many requests".to_string(),
                });
            }
            Ok(())
        }
    }

    struct ScriptedAuth {
        responses: Mutex<VecDeque<Result<TokenPair, RunError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedAuth {
        fn new(responses: Vec<Result<TokenPair, RunError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthEndpoint for ScriptedAuth {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenPair, RunError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected refresh call"))
        }
    }

    struct NullStore;

    #[async_trait]
    impl CredentialStore for NullStore {
        async fn load(&self) -> Result<Credentials, RunError> {
            panic!("load is not used by these tests")
        }

        async fn save(&self, _tokens: &TokenPair) -> Result<(), RunError> {
            Ok(())
        }
    }

    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) -> Result<(), RunError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn tokens(access: &str) -> TokenManager {
        TokenManager::new(
            TokenPair {
                access_token: access.to_string(),
                refresh_token: "refresh-0".to_string(),
            },
            Arc::new(ScriptedAuth::new(vec![Ok(TokenPair {
                access_token: "access-1".to_string(),
                refresh_token: "refresh-1".to_string(),
            })])),
            Arc::new(NullStore),
        )
    }

    fn tokens_with(auth: Arc<ScriptedAuth>) -> TokenManager {
        TokenManager::new(
            TokenPair {
                access_token: "access-0".to_string(),
                refresh_token: "refresh-0".to_string(),
            },
            auth,
            Arc::new(NullStore),
        )
    }

    fn denied() -> RunError {
        RunError::Auth {
            status: 403,
            body: "token expired".to_string(),
        }
    }

    fn eligible_item(id: &str, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "access": {"type": {"id": "clients"}},
            "can_publish_or_update": true
        })
    }

    fn coordinator(
        tokens: TokenManager,
        api: ScriptedApi,
        notifier: RecordingNotifier,
    ) -> (RunCoordinator, Arc<ScriptedApi>, Arc<RecordingNotifier>) {
        let api = Arc::new(api);
        let notifier = Arc::new(notifier);
        (
            RunCoordinator::new(tokens, api.clone(), notifier.clone(), false),
            api,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_eligible_resume_is_published_and_notified() {
        let listing = json!({"items": [eligible_item("r1", "Dev")]});
        let (mut coordinator, api, notifier) = coordinator(
            tokens("access-0"),
            ScriptedApi::new(vec![Ok(listing)]),
            RecordingNotifier::new(),
        );

        let results = coordinator.run().await.unwrap();

        assert_eq!(api.publish_calls.lock().unwrap().as_slice(), &["r1"]);
        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Dev"));
        assert_eq!(results.len(), 1);
        assert!(results[0].published);
        assert!(results[0].notified);
    }

    #[tokio::test]
    async fn test_site_visibility_publishes_and_notifies_nothing() {
        let listing = json!({
            "items": [{
                "id": "r1",
                "title": "Dev",
                "access": {"type": {"id": "site"}},
                "can_publish_or_update": true
            }]
        });
        let (mut coordinator, api, notifier) = coordinator(
            tokens("access-0"),
            ScriptedApi::new(vec![Ok(listing)]),
            RecordingNotifier::new(),
        );

        let results = coordinator.run().await.unwrap();

        assert!(api.publish_calls.lock().unwrap().is_empty());
        assert!(notifier.messages.lock().unwrap().is_empty());
        assert_eq!(results[0].decision, Decision::SkipNotVisible);
        assert!(!results[0].published);
    }

    #[tokio::test]
    async fn test_first_listing_failure_refreshes_and_retries_with_new_token() {
        let listing = json!({"items": []});
        let auth = Arc::new(ScriptedAuth::new(vec![Ok(TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        })]));
        let (mut coordinator, api, _notifier) = coordinator(
            tokens_with(auth.clone()),
            ScriptedApi::new(vec![Err(denied()), Ok(listing)]),
            RecordingNotifier::new(),
        );

        let results = coordinator.run().await.unwrap();

        assert!(results.is_empty());
        assert_eq!(*auth.calls.lock().unwrap(), 1);
        // The retry must carry the freshly issued access token.
        let list_calls = api.list_calls.lock().unwrap();
        assert_eq!(list_calls.as_slice(), &["access-0", "access-1"]);
    }

    #[tokio::test]
    async fn test_persistent_auth_failure_stops_after_two_lists_one_refresh() {
        let auth = Arc::new(ScriptedAuth::new(vec![Ok(TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        })]));
        let (mut coordinator, api, _notifier) = coordinator(
            tokens_with(auth.clone()),
            ScriptedApi::new(vec![Err(denied()), Err(denied())]),
            RecordingNotifier::new(),
        );

        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(err, RunError::Auth { status: 403, .. }));
        assert_eq!(api.list_calls.lock().unwrap().len(), 2);
        assert_eq!(*auth.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_aborts_without_second_listing() {
        let auth = Arc::new(ScriptedAuth::new(vec![Err(RunError::Auth {
            status: 400,
            body: "refresh token revoked".to_string(),
        })]));
        let (mut coordinator, api, _notifier) = coordinator(
            tokens_with(auth),
            ScriptedApi::new(vec![Err(denied())]),
            RecordingNotifier::new(),
        );

        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(err, RunError::Auth { status: 400, .. }));
        assert_eq!(api.list_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_failed_publish_does_not_block_the_rest() {
        let listing = json!({
            "items": [
                eligible_item("r1", "Dev"),
                eligible_item("r2", "QA"),
                eligible_item("r3", "Ops")
            ]
        });
        let (mut coordinator, api, notifier) = coordinator(
            tokens("access-0"),
            ScriptedApi::new(vec![Ok(listing)]).failing_publish("r2"),
            RecordingNotifier::new(),
        );

        let results = coordinator.run().await.unwrap();

        assert_eq!(
            api.publish_calls.lock().unwrap().as_slice(),
            &["r1", "r2", "r3"]
        );
        assert_eq!(results.len(), 3);

        assert!(results[0].published && results[0].notified);
        assert!(!results[1].published && !results[1].notified);
        assert!(results[1].error.as_deref().unwrap().contains("429"));
        assert!(results[2].published && results[2].notified);

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("Dev"));
        assert!(messages[1].contains("Ops"));
    }

    #[tokio::test]
    async fn test_cooldown_resume_waits_without_side_effects() {
        let listing = json!({
            "items": [{
                "id": "r1",
                "title": "Dev",
                "access": {"type": {"id": "clients"}},
                "can_publish_or_update": false,
                "next_publish_at": "2024-05-01T12:30:00+0300"
            }]
        });
        let (mut coordinator, api, notifier) = coordinator(
            tokens("access-0"),
            ScriptedApi::new(vec![Ok(listing)]),
            RecordingNotifier::new(),
        );

        let results = coordinator.run().await.unwrap();

        assert!(api.publish_calls.lock().unwrap().is_empty());
        assert!(notifier.messages.lock().unwrap().is_empty());
        assert!(matches!(results[0].decision, Decision::WaitUntil(_)));
    }

    #[tokio::test]
    async fn test_malformed_cooldown_timestamp_aborts_the_run() {
        let listing = json!({
            "items": [
                eligible_item("r1", "Dev"),
                {
                    "id": "r2",
                    "title": "QA",
                    "access": {"type": {"id": "clients"}},
                    "can_publish_or_update": false,
                    "next_publish_at": "not a timestamp"
                }
            ]
        });
        let (mut coordinator, api, _notifier) = coordinator(
            tokens("access-0"),
            ScriptedApi::new(vec![Ok(listing)]),
            RecordingNotifier::new(),
        );

        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(err, RunError::Schema(_)));
        // The first resume was still acted on before the abort.
        assert_eq!(api.publish_calls.lock().unwrap().as_slice(), &["r1"]);
    }

    #[tokio::test]
    async fn test_listing_without_items_is_a_schema_error() {
        let (mut coordinator, _api, _notifier) = coordinator(
            tokens("access-0"),
            ScriptedApi::new(vec![Ok(json!({"found": 0}))]),
            RecordingNotifier::new(),
        );

        let err = coordinator.run().await.unwrap_err();
        assert!(matches!(err, RunError::Schema(_)));
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _message: &str) -> Result<(), RunError> {
            Err(RunError::Notification("chat unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_roll_back_the_publish() {
        let listing = json!({"items": [eligible_item("r1", "Dev")]});
        let api = Arc::new(ScriptedApi::new(vec![Ok(listing)]));
        let mut coordinator = RunCoordinator::new(
            tokens("access-0"),
            api.clone(),
            Arc::new(FailingNotifier),
            false,
        );

        let results = coordinator.run().await.unwrap();

        assert!(results[0].published);
        assert!(!results[0].notified);
        assert!(results[0].error.is_none());
    }
}
