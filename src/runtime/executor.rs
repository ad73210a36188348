//! Session runtime executor

use super::traits::{ExplanationOracle, VerdictOracle};
use super::SseEvent;
use crate::flows::{EligibilityRequest, ExplainRequest};
use crate::session::{Message, SessionStore};
use crate::state_machine::{transition, ChatState, Effect, Event, SessionContext};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// User-facing copy for a failed explanation request.
pub const EXPLANATION_ERROR: &str =
    "An error occurred while fetching the scheme explanation. Please try again.";

/// User-facing copy for a failed verdict request.
pub const ELIGIBILITY_ERROR: &str =
    "An error occurred while checking eligibility. Please try again.";

/// Runtime driving one session's state machine.
///
/// Owns the session's state, applies pure transitions for incoming events,
/// and executes the resulting effects: transcript writes, broadcast
/// notifications, and oracle calls dispatched on background tasks that feed
/// their resolution back through the event channel.
pub struct ChatRuntime {
    context: SessionContext,
    state: ChatState,
    store: SessionStore,
    explanation_oracle: Arc<dyn ExplanationOracle>,
    verdict_oracle: Arc<dyn VerdictOracle>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl ChatRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: SessionContext,
        state: ChatState,
        store: SessionStore,
        explanation_oracle: Arc<dyn ExplanationOracle>,
        verdict_oracle: Arc<dyn VerdictOracle>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            context,
            state,
            store,
            explanation_oracle,
            verdict_oracle,
            event_rx,
            event_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::error!(
                    session_id = %self.context.session_id,
                    error = %e,
                    "Error handling event"
                );
                let _ = self.broadcast_tx.send(SseEvent::Error { message: e });
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), String> {
        let next_id = self
            .store
            .next_message_id(&self.context.session_id)
            .map_err(|e| e.to_string())?;

        let result = match transition(&self.state, &self.context, next_id, event) {
            Ok(result) => result,
            Err(rejection) => {
                // Invalid or untimely actions are silent no-ops: the
                // transcript and state stay untouched.
                tracing::debug!(
                    session_id = %self.context.session_id,
                    reason = %rejection,
                    "Dropping event"
                );
                return Ok(());
            }
        };

        self.state = result.new_state;
        self.store
            .set_state(&self.context.session_id, &self.state)
            .map_err(|e| e.to_string())?;
        let _ = self.broadcast_tx.send(SseEvent::StateChange {
            state: state_to_json(&self.state),
        });

        for effect in result.effects {
            self.execute_effect(effect)?;
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) -> Result<(), String> {
        match effect {
            Effect::Append { id, role, content } => {
                let message = self
                    .store
                    .append_message(&self.context.session_id, Message::new(id, role, content))
                    .map_err(|e| e.to_string())?;
                let _ = self.broadcast_tx.send(SseEvent::Message {
                    message: message_to_json(&message),
                });
            }

            Effect::Replace { id, content } => {
                let message = self
                    .store
                    .update_message(&self.context.session_id, id, content)
                    .map_err(|e| e.to_string())?;
                let _ = self.broadcast_tx.send(SseEvent::MessageUpdate {
                    message: message_to_json(&message),
                });
            }

            Effect::RequestExplanation { query } => {
                // The language preference is read at request time, not at
                // submission time.
                let language = self
                    .store
                    .language(&self.context.session_id)
                    .map_err(|e| e.to_string())?;
                let request = ExplainRequest { query, language };

                let oracle = Arc::clone(&self.explanation_oracle);
                let event_tx = self.event_tx.clone();
                let session_id = self.context.session_id.clone();
                tokio::spawn(async move {
                    let event = match oracle.explain(&request).await {
                        Ok(explanation) => Event::ExplanationReady { explanation },
                        Err(e) => {
                            tracing::error!(
                                session_id = %session_id,
                                error = %e,
                                "Explanation request failed"
                            );
                            Event::ExplanationFailed {
                                message: EXPLANATION_ERROR.to_string(),
                            }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::RequestVerdict {
                scheme,
                questions,
                answers,
            } => {
                let request = EligibilityRequest {
                    scheme_name: scheme.name().to_string(),
                    questions,
                    answers,
                };

                let oracle = Arc::clone(&self.verdict_oracle);
                let event_tx = self.event_tx.clone();
                let session_id = self.context.session_id.clone();
                tokio::spawn(async move {
                    let event = match oracle.check(&request).await {
                        Ok(verdict) => Event::VerdictReady { verdict },
                        Err(e) => {
                            tracing::error!(
                                session_id = %session_id,
                                error = %e,
                                "Verdict request failed"
                            );
                            Event::VerdictFailed {
                                message: ELIGIBILITY_ERROR.to_string(),
                            }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::Notify { message } => {
                let _ = self.broadcast_tx.send(SseEvent::Toast { message });
            }
        }

        Ok(())
    }
}

pub(super) fn message_to_json(message: &Message) -> Value {
    serde_json::to_value(message).unwrap_or(Value::Null)
}

pub(super) fn state_to_json(state: &ChatState) -> Value {
    serde_json::to_value(state).unwrap_or(Value::Null)
}
