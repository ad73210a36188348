//! Pure state transition function
//!
//! The whole conversation flow lives here: free-text submission, explanation
//! resolution, the one-question-at-a-time eligibility interview, and verdict
//! resolution. The function is pure: message identifiers are pre-allocated
//! by the caller and all I/O is returned as effects.

use super::{ChatState, Effect, Event, SessionContext};
use crate::schemes::{detect_scheme, questions_for, Scheme};
use crate::session::{MessageContent, MessageId};
use thiserror::Error;

/// Informational entry opening an interview.
pub const ELIGIBILITY_INTRO: &str = "Let's quickly check your eligibility.";

/// Entry appended when a scheme has no eligibility flow.
pub const ELIGIBILITY_UNAVAILABLE: &str =
    "Sorry, eligibility check isn't available for this scheme yet.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejected transitions. The runtime drops these silently: the transcript
/// and state are left untouched.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Session is busy, action dropped")]
    Busy,
    #[error("Empty query ignored")]
    EmptyQuery,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// `next_id` is the first unallocated message identifier; a transition that
/// appends k entries uses `next_id` through `next_id + k - 1` in effect
/// order.
pub fn transition(
    state: &ChatState,
    _context: &SessionContext,
    next_id: MessageId,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Free-text query -> explanation request
        // ============================================================
        (ChatState::Idle, Event::SubmitQuery { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyQuery);
            }

            let placeholder = next_id.next();
            let scheme = detect_scheme(&text);

            Ok(TransitionResult::new(ChatState::AwaitingExplanation { placeholder, scheme })
                .with_effect(Effect::append_user(next_id, MessageContent::text(text.clone())))
                .with_effect(Effect::append_bot(placeholder, MessageContent::Loading))
                .with_effect(Effect::RequestExplanation { query: text }))
        }

        // ============================================================
        // Explanation resolution
        // ============================================================
        (
            ChatState::AwaitingExplanation { placeholder, scheme },
            Event::ExplanationReady { explanation },
        ) => Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::Replace {
            id: *placeholder,
            content: MessageContent::Explanation {
                explanation,
                scheme: *scheme,
            },
        })),

        (ChatState::AwaitingExplanation { placeholder, .. }, Event::ExplanationFailed { message }) => {
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::Replace {
                    id: *placeholder,
                    content: MessageContent::error(message.clone()),
                })
                .with_effect(Effect::Notify { message }))
        }

        // ============================================================
        // Eligibility interview start
        // ============================================================
        (ChatState::Idle, Event::StartEligibility { scheme_name }) => {
            // An empty question list is the registry's "no eligibility flow
            // available" signal, not an error.
            let questions = questions_for(&scheme_name);
            match scheme_name.parse::<Scheme>() {
                Ok(scheme) if !questions.is_empty() => {
                    let question_message = next_id.next();
                    Ok(TransitionResult::new(ChatState::InterviewActive {
                        scheme,
                        question_index: 0,
                        answers: vec![],
                        question_message,
                    })
                    .with_effect(Effect::append_bot(
                        next_id,
                        MessageContent::text(ELIGIBILITY_INTRO),
                    ))
                    .with_effect(Effect::append_bot(
                        question_message,
                        MessageContent::Question {
                            question: questions[0].to_string(),
                        },
                    )))
                }
                _ => Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::append_bot(
                    next_id,
                    MessageContent::text(ELIGIBILITY_UNAVAILABLE),
                ))),
            }
        }

        // ============================================================
        // Interview answers
        // ============================================================
        (
            ChatState::InterviewActive {
                scheme,
                question_index,
                answers,
                question_message,
            },
            Event::Answer { value },
        ) => {
            let questions = scheme.questions();
            let Some(current) = questions.get(*question_index) else {
                return Err(TransitionError::InvalidTransition(format!(
                    "Question index {question_index} out of range for {scheme}"
                )));
            };

            let mut new_answers = answers.clone();
            new_answers.push(value);
            let next_index = question_index + 1;

            // Freeze the answered question and echo the answer.
            let freeze = Effect::Replace {
                id: *question_message,
                content: MessageContent::text(*current),
            };
            let echo = Effect::append_user(
                next_id,
                MessageContent::text(if value { "Yes" } else { "No" }),
            );

            if next_index < questions.len() {
                let question_message = next_id.next();
                Ok(TransitionResult::new(ChatState::InterviewActive {
                    scheme: *scheme,
                    question_index: next_index,
                    answers: new_answers,
                    question_message,
                })
                .with_effect(freeze)
                .with_effect(echo)
                .with_effect(Effect::append_bot(
                    question_message,
                    MessageContent::Question {
                        question: questions[next_index].to_string(),
                    },
                )))
            } else {
                // Last answer: the interview state is dropped the moment the
                // verdict request is issued.
                let placeholder = next_id.next();
                Ok(TransitionResult::new(ChatState::AwaitingVerdict { placeholder })
                    .with_effect(freeze)
                    .with_effect(echo)
                    .with_effect(Effect::append_bot(placeholder, MessageContent::Loading))
                    .with_effect(Effect::RequestVerdict {
                        scheme: *scheme,
                        questions: questions.iter().map(ToString::to_string).collect(),
                        answers: new_answers,
                    }))
            }
        }

        // ============================================================
        // Verdict resolution
        // ============================================================
        (ChatState::AwaitingVerdict { placeholder }, Event::VerdictReady { verdict }) => {
            Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::Replace {
                id: *placeholder,
                content: MessageContent::Verdict { verdict },
            }))
        }

        (ChatState::AwaitingVerdict { placeholder }, Event::VerdictFailed { message }) => {
            Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::Replace {
                id: *placeholder,
                content: MessageContent::error(message),
            }))
        }

        // ============================================================
        // Dropped actions
        // ============================================================

        // User actions while a disabling state is active
        (state, Event::SubmitQuery { .. } | Event::StartEligibility { .. })
            if state.is_busy() =>
        {
            Err(TransitionError::Busy)
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}
