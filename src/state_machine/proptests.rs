//! Property-based tests for the state machine
//!
//! These verify the interview and placeholder invariants hold across all
//! possible inputs, not just the hand-picked cases in the unit tests.

use super::*;
use crate::schemes::Scheme;
use crate::session::{MessageContent, MessageId};
use proptest::prelude::*;

fn test_context() -> SessionContext {
    SessionContext::new("prop-session")
}

fn arb_scheme() -> impl Strategy<Value = Scheme> {
    prop_oneof![
        Just(Scheme::Pmay),
        Just(Scheme::PmKisan),
        Just(Scheme::AyushmanBharat),
    ]
}

fn arb_busy_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        any::<u64>().prop_map(|n| ChatState::AwaitingExplanation {
            placeholder: MessageId(n),
            scheme: None,
        }),
        arb_scheme().prop_map(|scheme| ChatState::InterviewActive {
            scheme,
            question_index: 0,
            answers: vec![],
            question_message: MessageId(1),
        }),
        any::<u64>().prop_map(|n| ChatState::AwaitingVerdict {
            placeholder: MessageId(n),
        }),
    ]
}

/// Drive a full interview for `scheme` with the given answers, returning the
/// states visited and the final verdict request.
fn run_interview(
    scheme: Scheme,
    answers: &[bool],
) -> (Vec<ChatState>, Option<(Vec<String>, Vec<bool>)>) {
    let ctx = test_context();
    let mut next_id = MessageId(1);
    let mut states = Vec::new();
    let mut verdict_payload = None;

    let result = transition(
        &ChatState::Idle,
        &ctx,
        next_id,
        Event::StartEligibility {
            scheme_name: scheme.name().to_string(),
        },
    )
    .expect("start must succeed for known schemes");
    let mut state = result.new_state;
    next_id = MessageId(next_id.0 + result.effects.len() as u64);

    for answer in answers {
        states.push(state.clone());
        let result = transition(&state, &ctx, next_id, Event::Answer { value: *answer })
            .expect("answer must be accepted while the interview runs");
        for effect in &result.effects {
            if let Effect::RequestVerdict { questions, answers, .. } = effect {
                verdict_payload = Some((questions.clone(), answers.clone()));
            }
        }
        state = result.new_state;
        next_id = MessageId(next_id.0 + result.effects.len() as u64);
    }
    states.push(state);

    (states, verdict_payload)
}

proptest! {
    /// Answering all k questions visits exactly k InterviewActive states and
    /// one AwaitingVerdict state, and the verdict payload pairs every
    /// question with its answer in order.
    #[test]
    fn interview_visits_k_states_then_verdict(
        scheme in arb_scheme(),
        seed in proptest::collection::vec(any::<bool>(), 1..8),
    ) {
        let k = scheme.questions().len();
        let answers: Vec<bool> = seed.iter().copied().cycle().take(k).collect();

        let (states, payload) = run_interview(scheme, &answers);

        // k InterviewActive states, then AwaitingVerdict
        prop_assert_eq!(states.len(), k + 1);
        for (i, state) in states.iter().take(k).enumerate() {
            match state {
                ChatState::InterviewActive { question_index, answers: collected, .. } => {
                    prop_assert_eq!(*question_index, i);
                    // len(answers) == current question index between steps
                    prop_assert_eq!(collected.len(), i);
                }
                other => prop_assert!(false, "expected InterviewActive, got {:?}", other),
            }
        }
        prop_assert!(
            matches!(states[k], ChatState::AwaitingVerdict { .. }),
            "expected AwaitingVerdict"
        );

        let (questions, sent_answers) = payload.expect("verdict request must be issued");
        prop_assert_eq!(questions.len(), k);
        prop_assert_eq!(&sent_answers, &answers);
        for (question, expected) in questions.iter().zip(scheme.questions()) {
            prop_assert_eq!(question, expected);
        }
    }

    /// Submitting free text from Idle appends exactly one loading
    /// placeholder, and the new state tracks exactly that entry.
    #[test]
    fn submit_query_creates_one_placeholder(
        text in "[a-zA-Z ]{1,40}",
        start in 0u64..1000,
    ) {
        prop_assume!(!text.trim().is_empty());

        let result = transition(
            &ChatState::Idle,
            &test_context(),
            MessageId(start),
            Event::SubmitQuery { text },
        ).unwrap();

        let loading_ids: Vec<MessageId> = result.effects.iter().filter_map(|e| match e {
            Effect::Append { id, content: MessageContent::Loading, .. } => Some(*id),
            _ => None,
        }).collect();
        prop_assert_eq!(loading_ids.len(), 1);

        match result.new_state {
            ChatState::AwaitingExplanation { placeholder, .. } => {
                prop_assert_eq!(placeholder, loading_ids[0]);
            }
            other => prop_assert!(false, "expected AwaitingExplanation, got {:?}", other),
        }
    }

    /// Appended identifiers are allocated sequentially from `next_id`, so
    /// identifiers stay unique and monotonic across any event.
    #[test]
    fn appends_allocate_sequential_ids(
        start in 0u64..1000,
        text in "[a-z]{1,20}",
        scheme in arb_scheme(),
    ) {
        let events = vec![
            (ChatState::Idle, Event::SubmitQuery { text }),
            (ChatState::Idle, Event::StartEligibility { scheme_name: scheme.name().to_string() }),
            (
                ChatState::InterviewActive {
                    scheme,
                    question_index: 0,
                    answers: vec![],
                    question_message: MessageId(start),
                },
                Event::Answer { value: true },
            ),
        ];

        for (state, event) in events {
            let result = transition(&state, &test_context(), MessageId(start + 1), event).unwrap();
            let ids: Vec<u64> = result.effects.iter().filter_map(|e| match e {
                Effect::Append { id, .. } => Some(id.0),
                _ => None,
            }).collect();
            for (offset, id) in ids.iter().enumerate() {
                prop_assert_eq!(*id, start + 1 + offset as u64);
            }
        }
    }

    /// While any disabling state is active, user actions are rejected with
    /// no effects: the transcript is untouched.
    #[test]
    fn busy_states_drop_user_actions(
        state in arb_busy_state(),
        text in "[a-z]{1,20}",
        scheme in arb_scheme(),
    ) {
        let submit = transition(
            &state,
            &test_context(),
            MessageId(100),
            Event::SubmitQuery { text },
        );
        prop_assert!(matches!(submit, Err(TransitionError::Busy)));

        let start = transition(
            &state,
            &test_context(),
            MessageId(100),
            Event::StartEligibility { scheme_name: scheme.name().to_string() },
        );
        prop_assert!(matches!(start, Err(TransitionError::Busy)));
    }

    /// Oracle resolutions always return the machine to Idle, whatever the
    /// outcome, so the user can act again.
    #[test]
    fn resolutions_always_reach_idle(
        placeholder in 0u64..1000,
        message in "[a-z ]{1,30}",
        failed in any::<bool>(),
    ) {
        let state = ChatState::AwaitingVerdict { placeholder: MessageId(placeholder) };
        let event = if failed {
            Event::VerdictFailed { message }
        } else {
            Event::VerdictReady {
                verdict: crate::flows::EligibilityVerdict { is_eligible: true, reason: None },
            }
        };
        let result = transition(&state, &test_context(), MessageId(placeholder + 1), event).unwrap();
        prop_assert_eq!(result.new_state, ChatState::Idle);
    }
}
