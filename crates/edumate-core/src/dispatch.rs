//! One request cycle against the generate backend
//!
//! The dispatcher races the backend call against a cancellation timer and
//! folds every result into an [`Outcome`]. Nothing here returns an error:
//! the session decides how each outcome is shown.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendError, GenerateBackend, GenerateResponse};
use crate::policy::OutputPolicy;
use crate::session::SessionState;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const TIMEOUT_NOTICE: &str =
    "The request timed out before the backend answered. Please try again.";
pub const FAILURE_NOTICE: &str = "Error contacting backend. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Timeout,
    Transport,
    Decode,
    /// The request task ended without reporting back
    Aborted,
}

impl FailureCause {
    pub fn notice(&self) -> &'static str {
        match self {
            FailureCause::Timeout => TIMEOUT_NOTICE,
            FailureCause::Transport | FailureCause::Decode | FailureCause::Aborted => FAILURE_NOTICE,
        }
    }
}

impl From<&BackendError> for FailureCause {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Transport(e) if e.is_timeout() => FailureCause::Timeout,
            BackendError::Transport(e) if e.is_decode() => FailureCause::Decode,
            BackendError::Transport(_) => FailureCause::Transport,
            BackendError::Decode(_) => FailureCause::Decode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Generated(GenerateResponse),
    Rejected(String),
    Failed(FailureCause),
}

impl From<GenerateResponse> for Outcome {
    fn from(response: GenerateResponse) -> Self {
        match response.error {
            Some(error) => Outcome::Rejected(error),
            None => Outcome::Generated(response),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn GenerateBackend>,
    timeout: Duration,
    policy: OutputPolicy,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn GenerateBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            policy: OutputPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: OutputPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &OutputPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one prompt and wait for the backend or the timer, whichever is first.
    /// When the timer wins the pending request future is dropped.
    pub async fn dispatch(&self, prompt: &str) -> Outcome {
        tracing::info!(chars = prompt.chars().count(), "dispatching prompt");

        let outcome = match tokio::time::timeout(self.timeout, self.backend.generate(prompt)).await {
            Ok(Ok(response)) => Outcome::from(response),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "generate request failed");
                Outcome::Failed(FailureCause::from(&err))
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "generate request timed out");
                Outcome::Failed(FailureCause::Timeout)
            }
        };

        match &outcome {
            Outcome::Generated(_) => tracing::info!("generation succeeded"),
            Outcome::Rejected(error) => tracing::info!(%error, "backend rejected prompt"),
            Outcome::Failed(_) => {}
        }
        outcome
    }

    /// Run a whole cycle on `session`: guard, dispatch, apply.
    /// Returns false when the draft was blank and nothing was sent.
    pub async fn submit(&self, session: &mut SessionState) -> bool {
        let Some(prompt) = session.begin_submit() else {
            return false;
        };
        let outcome = self.dispatch(&prompt).await;
        session.complete(outcome, &self.policy);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MessageKind, Role};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Reply {
        Body(&'static str),
        Hang,
        BadJson,
    }

    struct MockBackend {
        reply: Reply,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerateBackend for MockBackend {
        async fn generate(&self, prompt: &str) -> Result<GenerateResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Reply::Body(body) => Ok(serde_json::from_str(body)?),
                Reply::BadJson => Ok(serde_json::from_str("<html>oops</html>")?),
                Reply::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    fn session_with(draft: &str) -> SessionState {
        let mut session = SessionState::new();
        session.set_draft(draft);
        session
    }

    #[tokio::test]
    async fn blank_prompt_sends_nothing() {
        let backend = MockBackend::new(Reply::Body("{}"));
        let dispatcher = Dispatcher::new(backend.clone());

        for draft in ["", "   ", "\n\t "] {
            let mut session = session_with(draft);
            assert!(!dispatcher.submit(&mut session).await);
            assert!(session.messages().is_empty());
            assert!(!session.in_flight());
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_appends_explanation_and_sets_result() {
        let backend = MockBackend::new(Reply::Body(r#"{"explanation":"E","code":"C","narration":"N"}"#));
        let dispatcher = Dispatcher::new(backend.clone());
        let mut session = session_with("  What is a derivative?  ");

        assert!(dispatcher.submit(&mut session).await);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "What is a derivative?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "E");

        let result = session.result().unwrap();
        assert_eq!(result.code, "C");
        assert_eq!(result.narration, "N");
        assert!(result.video_url.is_none());
        assert!(!session.in_flight());
        assert_eq!(backend.prompts.lock().unwrap().as_slice(), ["What is a derivative?"]);
    }

    #[tokio::test]
    async fn error_field_clears_result() {
        let ok = Dispatcher::new(MockBackend::new(Reply::Body(r#"{"explanation":"E","code":"C","narration":"N"}"#)));
        let rejecting = Dispatcher::new(MockBackend::new(Reply::Body(r#"{"error":"bad input"}"#)));
        let mut session = session_with("first");
        ok.submit(&mut session).await;
        assert!(session.result().is_some());

        session.set_draft("second");
        rejecting.submit(&mut session).await;

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.kind, MessageKind::Error);
        assert!(last.text.contains("bad input"));
        assert!(session.result().is_none());
        assert!(!session.in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_yields_single_failure_notice() {
        let dispatcher = Dispatcher::new(MockBackend::new(Reply::Hang));
        let mut session = session_with("slow topic");

        dispatcher.submit(&mut session).await;

        assert_eq!(session.messages().len(), 2);
        let last = session.messages().last().unwrap();
        assert_eq!(last.kind, MessageKind::Failure);
        assert_eq!(last.text, TIMEOUT_NOTICE);
        assert!(!session.in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_at_configured_duration() {
        let dispatcher = Dispatcher::new(MockBackend::new(Reply::Hang)).with_timeout(Duration::from_secs(5));
        let started = tokio::time::Instant::now();

        let outcome = dispatcher.dispatch("anything").await;

        assert_eq!(outcome, Outcome::Failed(FailureCause::Timeout));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_failure() {
        let dispatcher = Dispatcher::new(MockBackend::new(Reply::BadJson));
        let outcome = dispatcher.dispatch("x").await;
        assert_eq!(outcome, Outcome::Failed(FailureCause::Decode));
        assert_eq!(FailureCause::Decode.notice(), FAILURE_NOTICE);
    }

    #[test]
    fn error_field_wins_over_content() {
        let response = GenerateResponse {
            code: Some("C".into()),
            error: Some("quota".into()),
            ..Default::default()
        };
        assert_eq!(Outcome::from(response), Outcome::Rejected("quota".into()));
    }
}
