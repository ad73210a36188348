//! Mock oracles and an in-process harness for runtime tests

use super::traits::{ExplanationOracle, VerdictOracle};
use super::SseEvent;
use crate::flows::{EligibilityRequest, EligibilityVerdict, ExplainRequest, SchemeExplanation};
use crate::llm::LlmError;
use crate::session::{Message, SessionStore};
use crate::state_machine::{ChatState, Event, SessionContext};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};

// ============================================================================
// Mock Oracles
// ============================================================================

/// Mock explanation oracle that returns queued responses
pub struct MockExplanationOracle {
    responses: Mutex<VecDeque<Result<SchemeExplanation, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ExplainRequest>>,
}

impl MockExplanationOracle {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: SchemeExplanation) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ExplainRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExplanationOracle for MockExplanationOracle {
    async fn explain(&self, request: &ExplainRequest) -> Result<SchemeExplanation, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

/// Mock explanation oracle that blocks until released (for testing the
/// disabling states)
pub struct BlockingExplanationOracle {
    inner: MockExplanationOracle,
    /// Notified when a request starts
    pub request_started: Arc<Notify>,
    /// Signalled to let the request complete
    pub release: Arc<Notify>,
}

impl BlockingExplanationOracle {
    pub fn new() -> Self {
        Self {
            inner: MockExplanationOracle::new(),
            request_started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: SchemeExplanation) {
        self.inner.queue_response(response);
    }
}

#[async_trait]
impl ExplanationOracle for BlockingExplanationOracle {
    async fn explain(&self, request: &ExplainRequest) -> Result<SchemeExplanation, LlmError> {
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.explain(request).await
    }
}

/// Mock verdict oracle that returns queued responses
pub struct MockVerdictOracle {
    responses: Mutex<VecDeque<Result<EligibilityVerdict, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<EligibilityRequest>>,
}

impl MockVerdictOracle {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: EligibilityVerdict) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<EligibilityRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerdictOracle for MockVerdictOracle {
    async fn check(&self, request: &EligibilityRequest) -> Result<EligibilityVerdict, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

// ============================================================================
// Test Harness
// ============================================================================

pub const TEST_SESSION: &str = "test-session";

/// Spawn a runtime over a fresh session and return its channels
pub fn spawn_runtime(
    store: &SessionStore,
    explainer: Arc<dyn ExplanationOracle>,
    examiner: Arc<dyn VerdictOracle>,
) -> (mpsc::Sender<Event>, broadcast::Receiver<SseEvent>) {
    store.create_session(TEST_SESSION);

    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, broadcast_rx) = broadcast::channel(128);

    let runtime = super::ChatRuntime::new(
        SessionContext::new(TEST_SESSION),
        ChatState::Idle,
        store.clone(),
        explainer,
        examiner,
        event_rx,
        event_tx.clone(),
        broadcast_tx,
    );
    tokio::spawn(runtime.run());

    (event_tx, broadcast_rx)
}

/// Poll the transcript until the predicate holds or the timeout expires
pub async fn wait_until(
    store: &SessionStore,
    predicate: impl Fn(&[Message]) -> bool,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Ok(messages) = store.get_messages(TEST_SESSION) {
            if predicate(&messages) {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ELIGIBILITY_ERROR, EXPLANATION_ERROR};
    use crate::schemes::Scheme;
    use crate::session::{Language, MessageContent, Role};
    use crate::state_machine::ELIGIBILITY_UNAVAILABLE;

    const WAIT: Duration = Duration::from_secs(2);

    fn sample_explanation(link: Option<&str>) -> SchemeExplanation {
        SchemeExplanation {
            explanation: "PMAY subsidizes housing for families without a pucca house.".to_string(),
            eligibility: "Family must not own a pucca house.".to_string(),
            application_process: "Apply through the PMAY portal.".to_string(),
            official_link: link.map(String::from),
            language: "English".to_string(),
        }
    }

    fn settled(messages: &[Message]) -> bool {
        !messages.iter().any(|m| m.content.is_loading())
    }

    /// Scenario A: query matching PMAY, oracle returns a link -> rendered
    /// entry carries the explanation, the link, and the eligibility
    /// affordance.
    #[tokio::test]
    async fn test_explanation_with_link_and_eligibility_affordance() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        explainer.queue_response(sample_explanation(Some("https://pmaymis.gov.in")));
        let examiner = Arc::new(MockVerdictOracle::new());

        let (event_tx, _rx) =
            spawn_runtime(&store, explainer.clone(), examiner);

        event_tx
            .send(Event::SubmitQuery {
                text: "Tell me about PMAY".to_string(),
            })
            .await
            .unwrap();

        assert!(wait_until(&store, |m| m.len() == 3 && settled(m), WAIT).await);

        let messages = store.get_messages(TEST_SESSION).unwrap();
        assert_eq!(messages[1].role, Role::User);
        match &messages[2].content {
            MessageContent::Explanation { explanation, scheme } => {
                assert_eq!(
                    explanation.official_link.as_deref(),
                    Some("https://pmaymis.gov.in")
                );
                assert_eq!(*scheme, Some(Scheme::Pmay));
            }
            other => panic!("Expected explanation entry, got {other:?}"),
        }

        // The oracle saw the query with the session's (default) language
        let requests = explainer.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "Tell me about PMAY");
        assert_eq!(requests[0].language, Language::English);
    }

    /// The language preference is read at request time, not session start.
    #[tokio::test]
    async fn test_language_read_at_request_time() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        explainer.queue_response(sample_explanation(None));
        let examiner = Arc::new(MockVerdictOracle::new());

        let (event_tx, _rx) = spawn_runtime(&store, explainer.clone(), examiner);

        store.set_language(TEST_SESSION, Language::Telugu).unwrap();
        event_tx
            .send(Event::SubmitQuery {
                text: "pm-kisan details".to_string(),
            })
            .await
            .unwrap();

        assert!(wait_until(&store, |m| m.len() == 3 && settled(m), WAIT).await);
        assert_eq!(
            explainer.recorded_requests()[0].language,
            Language::Telugu
        );
    }

    /// Scenario D: oracle failure -> pending entry becomes an inline error,
    /// a toast is raised, and the session is usable again.
    #[tokio::test]
    async fn test_explanation_failure_recovers_to_idle() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        explainer.queue_error(LlmError::server_error("boom"));
        explainer.queue_response(sample_explanation(None));
        let examiner = Arc::new(MockVerdictOracle::new());

        let (event_tx, mut rx) = spawn_runtime(&store, explainer.clone(), examiner);

        event_tx
            .send(Event::SubmitQuery {
                text: "Tell me about PMAY".to_string(),
            })
            .await
            .unwrap();

        assert!(wait_until(&store, |m| m.len() == 3 && settled(m), WAIT).await);

        let messages = store.get_messages(TEST_SESSION).unwrap();
        assert_eq!(
            messages[2].content,
            MessageContent::error(EXPLANATION_ERROR)
        );

        // A toast was broadcast for the explanation failure
        let mut saw_toast = false;
        let deadline = tokio::time::Instant::now() + WAIT;
        while !saw_toast && tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
                Ok(Ok(SseEvent::Toast { message })) => {
                    assert_eq!(message, EXPLANATION_ERROR);
                    saw_toast = true;
                }
                Ok(Ok(_)) => continue,
                _ => continue,
            }
        }
        assert!(saw_toast, "Expected a toast for the explanation failure");

        // Back in Idle: a fresh submission goes through
        event_tx
            .send(Event::SubmitQuery {
                text: "Tell me about PMAY again".to_string(),
            })
            .await
            .unwrap();
        assert!(wait_until(&store, |m| m.len() == 5 && settled(m), WAIT).await);
        assert!(matches!(
            store.get_messages(TEST_SESSION).unwrap()[4].content,
            MessageContent::Explanation { .. }
        ));
    }

    /// Scenario B: single-question interview issues the exact verdict
    /// payload and freezes the question entry.
    #[tokio::test]
    async fn test_single_question_interview() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        let examiner = Arc::new(MockVerdictOracle::new());
        examiner.queue_response(EligibilityVerdict {
            is_eligible: false,
            reason: Some("Your family already owns a pucca house.".to_string()),
        });

        let (event_tx, _rx) = spawn_runtime(&store, explainer, examiner.clone());

        event_tx
            .send(Event::StartEligibility {
                scheme_name: "PMAY".to_string(),
            })
            .await
            .unwrap();

        // Intro + interactive question appended
        assert!(
            wait_until(
                &store,
                |m| m.len() == 3
                    && matches!(m[2].content, MessageContent::Question { .. }),
                WAIT
            )
            .await
        );

        event_tx.send(Event::Answer { value: true }).await.unwrap();

        // Echo + verdict placeholder resolved
        assert!(wait_until(&store, |m| m.len() == 5 && settled(m), WAIT).await);

        let requests = examiner.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].scheme_name, "PMAY");
        assert_eq!(
            requests[0].questions,
            vec!["Does your family own a pucca house already?".to_string()]
        );
        assert_eq!(requests[0].answers, vec![true]);

        let messages = store.get_messages(TEST_SESSION).unwrap();
        // Question frozen into plain text
        assert_eq!(
            messages[2].content,
            MessageContent::text("Does your family own a pucca house already?")
        );
        // Answer echoed as a user entry
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].content, MessageContent::text("Yes"));
        // Verdict rendered
        assert!(matches!(
            &messages[4].content,
            MessageContent::Verdict { verdict } if !verdict.is_eligible
        ));
    }

    /// Scenario C: two-question interview preserves answer order.
    #[tokio::test]
    async fn test_answer_order_preserved() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        let examiner = Arc::new(MockVerdictOracle::new());
        examiner.queue_response(EligibilityVerdict {
            is_eligible: true,
            reason: None,
        });

        let (event_tx, _rx) = spawn_runtime(&store, explainer, examiner.clone());

        event_tx
            .send(Event::StartEligibility {
                scheme_name: "Ayushman Bharat".to_string(),
            })
            .await
            .unwrap();
        assert!(
            wait_until(
                &store,
                |m| matches!(m.last().map(|m| &m.content), Some(MessageContent::Question { .. })),
                WAIT
            )
            .await
        );

        event_tx.send(Event::Answer { value: false }).await.unwrap();
        assert!(
            wait_until(
                &store,
                |m| m.len() == 5
                    && matches!(m[4].content, MessageContent::Question { .. }),
                WAIT
            )
            .await
        );

        event_tx.send(Event::Answer { value: true }).await.unwrap();
        assert!(wait_until(&store, |m| m.len() == 7 && settled(m), WAIT).await);

        let requests = examiner.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].answers, vec![false, true]);
        assert_eq!(requests[0].questions.len(), 2);
    }

    /// Verdict failures render inline only; no toast.
    #[tokio::test]
    async fn test_verdict_failure_inline_only() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        let examiner = Arc::new(MockVerdictOracle::new());
        examiner.queue_error(LlmError::network("down"));

        let (event_tx, mut rx) = spawn_runtime(&store, explainer, examiner);

        event_tx
            .send(Event::StartEligibility {
                scheme_name: "PM-Kisan".to_string(),
            })
            .await
            .unwrap();
        assert!(
            wait_until(
                &store,
                |m| matches!(m.last().map(|m| &m.content), Some(MessageContent::Question { .. })),
                WAIT
            )
            .await
        );
        event_tx.send(Event::Answer { value: false }).await.unwrap();

        assert!(wait_until(&store, |m| m.len() == 5 && settled(m), WAIT).await);
        let messages = store.get_messages(TEST_SESSION).unwrap();
        assert_eq!(messages[4].content, MessageContent::error(ELIGIBILITY_ERROR));

        tokio::time::sleep(Duration::from_millis(50)).await;
        while let Ok(event) = rx.try_recv() {
            assert!(
                !matches!(event, SseEvent::Toast { .. }),
                "Verdict failures must not raise a toast"
            );
        }
    }

    /// Starting an eligibility check for an unknown scheme appends exactly
    /// one "unavailable" entry and never starts an interview.
    #[tokio::test]
    async fn test_unknown_scheme_unavailable() {
        let store = SessionStore::new();
        let explainer = Arc::new(MockExplanationOracle::new());
        let examiner = Arc::new(MockVerdictOracle::new());

        let (event_tx, _rx) = spawn_runtime(&store, explainer, examiner);

        event_tx
            .send(Event::StartEligibility {
                scheme_name: "Startup India".to_string(),
            })
            .await
            .unwrap();

        assert!(wait_until(&store, |m| m.len() == 2, WAIT).await);
        let messages = store.get_messages(TEST_SESSION).unwrap();
        assert_eq!(
            messages[1].content,
            MessageContent::text(ELIGIBILITY_UNAVAILABLE)
        );
        assert_eq!(store.get_state(TEST_SESSION).unwrap(), ChatState::Idle);

        // And nothing else arrives
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get_messages(TEST_SESSION).unwrap().len(), 2);
    }

    /// While an explanation request is outstanding, further user actions
    /// are silent no-ops: the transcript length does not change.
    #[tokio::test]
    async fn test_disabling_state_drops_actions() {
        let store = SessionStore::new();
        let explainer = Arc::new(BlockingExplanationOracle::new());
        explainer.queue_response(sample_explanation(None));
        let examiner = Arc::new(MockVerdictOracle::new());
        let request_started = explainer.request_started.clone();
        let release = explainer.release.clone();

        let (event_tx, _rx) = spawn_runtime(&store, explainer, examiner);

        event_tx
            .send(Event::SubmitQuery {
                text: "Tell me about PMAY".to_string(),
            })
            .await
            .unwrap();

        tokio::time::timeout(WAIT, request_started.notified())
            .await
            .expect("explanation request should start");

        // Welcome + user + loading
        assert_eq!(store.get_messages(TEST_SESSION).unwrap().len(), 3);

        event_tx
            .send(Event::SubmitQuery {
                text: "another question".to_string(),
            })
            .await
            .unwrap();
        event_tx
            .send(Event::StartEligibility {
                scheme_name: "PMAY".to_string(),
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Dropped: transcript unchanged
        assert_eq!(store.get_messages(TEST_SESSION).unwrap().len(), 3);

        // Let the outstanding request settle; exactly the one placeholder
        // resolves
        release.notify_one();
        assert!(wait_until(&store, |m| m.len() == 3 && settled(m), WAIT).await);
    }
}
