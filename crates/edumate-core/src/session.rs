use crate::dispatch::Outcome;
use crate::policy::{OutputPolicy, NO_CODE, NO_EXPLANATION, NO_NARRATION};
use crate::state::{GenerationResult, Message};

/// View state for one running client.
///
/// The message log is append-only; `log_revision` increases with every
/// append so a front-end can notice new messages without diffing the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    draft: String,
    messages: Vec<Message>,
    result: Option<GenerationResult>,
    in_flight: bool,
    log_revision: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: &str) {
        self.draft = draft.to_string();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn log_revision(&self) -> u64 {
        self.log_revision
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.log_revision += 1;
    }

    /// Start a request cycle from the current draft.
    ///
    /// Returns the trimmed prompt to send, or `None` when the draft is blank
    /// or a request is already in flight. On `Some` the user message is
    /// already in the log and the draft is cleared.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.in_flight {
            return None;
        }
        let prompt = self.draft.trim();
        if prompt.is_empty() {
            return None;
        }
        let prompt = prompt.to_string();

        self.push(Message::user(prompt.clone()));
        self.draft.clear();
        self.in_flight = true;
        Some(prompt)
    }

    /// Finish the current cycle. Always clears the in-flight flag.
    pub fn complete(&mut self, outcome: Outcome, policy: &OutputPolicy) {
        match outcome {
            Outcome::Generated(response) => {
                let explanation = response
                    .explanation
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| NO_EXPLANATION.to_string());
                self.push(Message::assistant(explanation));

                let video_url = if policy.show_video {
                    response.video_url.filter(|url| !url.trim().is_empty())
                } else {
                    None
                };
                self.result = Some(GenerationResult {
                    code: policy.fallbacks.apply(response.code, NO_CODE),
                    narration: policy.fallbacks.apply(response.narration, NO_NARRATION),
                    video_url,
                });
            }
            Outcome::Rejected(error) => {
                self.push(Message::backend_error(&error));
                self.result = None;
            }
            // Output pane keeps whatever it showed before
            Outcome::Failed(cause) => {
                self.push(Message::failure(cause.notice()));
            }
        }
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerateResponse;
    use crate::dispatch::{FailureCause, FAILURE_NOTICE};
    use crate::policy::FallbackPolicy;
    use crate::state::{MessageKind, Role};

    fn generated(explanation: Option<&str>, code: Option<&str>, narration: Option<&str>) -> Outcome {
        Outcome::Generated(GenerateResponse {
            explanation: explanation.map(String::from),
            code: code.map(String::from),
            narration: narration.map(String::from),
            ..Default::default()
        })
    }

    fn in_flight_session(prompt: &str) -> SessionState {
        let mut session = SessionState::new();
        session.set_draft(prompt);
        session.begin_submit().unwrap();
        session
    }

    #[test]
    fn begin_submit_logs_user_message_before_response() {
        let mut session = SessionState::new();
        session.set_draft("  Pythagorean theorem ");

        let prompt = session.begin_submit();

        assert_eq!(prompt.as_deref(), Some("Pythagorean theorem"));
        assert_eq!(session.messages(), [Message::user("Pythagorean theorem")]);
        assert_eq!(session.draft(), "");
        assert!(session.in_flight());
        assert_eq!(session.log_revision(), 1);
    }

    #[test]
    fn begin_submit_ignores_blank_draft() {
        let mut session = SessionState::new();
        session.set_draft(" \t ");
        assert!(session.begin_submit().is_none());
        assert!(session.messages().is_empty());
        assert_eq!(session.draft(), " \t ");
        assert!(!session.in_flight());
        assert_eq!(session.log_revision(), 0);
    }

    #[test]
    fn begin_submit_refuses_second_request_while_in_flight() {
        let mut session = in_flight_session("one");
        session.set_draft("two");
        assert!(session.begin_submit().is_none());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.draft(), "two");
    }

    #[test]
    fn missing_fields_use_placeholders_by_default() {
        let mut session = in_flight_session("topic");
        session.complete(generated(None, None, Some("")), &OutputPolicy::default());

        assert_eq!(session.messages()[1].text, NO_EXPLANATION);
        let result = session.result().unwrap();
        assert_eq!(result.code, NO_CODE);
        assert_eq!(result.narration, NO_NARRATION);
    }

    #[test]
    fn verbatim_policy_leaves_fields_empty() {
        let policy = OutputPolicy {
            fallbacks: FallbackPolicy::Verbatim,
            show_video: true,
        };
        let mut session = in_flight_session("topic");
        session.complete(generated(Some("E"), None, Some("N")), &policy);

        let result = session.result().unwrap();
        assert_eq!(result.code, "");
        assert_eq!(result.narration, "N");
    }

    #[test]
    fn video_url_kept_only_when_enabled() {
        let response = GenerateResponse {
            explanation: Some("E".into()),
            video_url: Some("http://localhost:5000/media/scene.mp4".into()),
            ..Default::default()
        };

        let mut session = in_flight_session("topic");
        session.complete(Outcome::Generated(response.clone()), &OutputPolicy::default());
        assert_eq!(
            session.result().unwrap().video_url.as_deref(),
            Some("http://localhost:5000/media/scene.mp4")
        );

        let hidden = OutputPolicy {
            show_video: false,
            ..OutputPolicy::default()
        };
        let mut session = in_flight_session("topic");
        session.complete(Outcome::Generated(response), &hidden);
        assert!(session.result().unwrap().video_url.is_none());
    }

    #[test]
    fn failure_leaves_previous_result_in_place() {
        let mut session = in_flight_session("first");
        session.complete(generated(Some("E"), Some("C"), Some("N")), &OutputPolicy::default());
        let before = session.result().cloned();

        session.set_draft("second");
        session.begin_submit().unwrap();
        session.complete(Outcome::Failed(FailureCause::Transport), &OutputPolicy::default());

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.kind, MessageKind::Failure);
        assert_eq!(last.text, FAILURE_NOTICE);
        assert_eq!(session.result().cloned(), before);
        assert!(!session.in_flight());
    }

    #[test]
    fn every_outcome_clears_in_flight_and_appends_once() {
        let outcomes = [
            generated(Some("E"), Some("C"), Some("N")),
            Outcome::Rejected("bad input".into()),
            Outcome::Failed(FailureCause::Timeout),
            Outcome::Failed(FailureCause::Aborted),
        ];
        for outcome in outcomes {
            let mut session = in_flight_session("topic");
            session.complete(outcome, &OutputPolicy::default());
            assert!(!session.in_flight());
            assert_eq!(session.messages().len(), 2);
            assert_eq!(session.log_revision(), 2);
        }
    }
}
