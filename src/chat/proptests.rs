//! Property-based tests for the store and the orchestrator
//!
//! Random sequences of submits (succeeding or failing, blank or not) and
//! clears must never break the placeholder or ordering invariants.

use super::testing::MockGenerator;
use super::*;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast;

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Submit { text: String, fails: bool },
    Clear,
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z?!]{1,20}",
        2 => "[ \t]{0,3}[a-zA-Z ]{1,20}[ \n]{0,3}",
        1 => "[ \t\n]{0,5}",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_text(), any::<bool>()).prop_map(|(text, fails)| Op::Submit { text, fails }),
        1 => Just(Op::Clear),
    ]
}

#[derive(Debug, Clone)]
enum StoreOp {
    Append(String, bool),
    AppendLoading,
    RemoveAt(usize),
    RemoveMissing,
    Clear,
}

fn arb_store_op() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => ("[a-z]{0,8}", any::<bool>()).prop_map(|(t, user)| StoreOp::Append(t, user)),
        1 => Just(StoreOp::AppendLoading),
        2 => (0usize..16).prop_map(StoreOp::RemoveAt),
        1 => Just(StoreOp::RemoveMissing),
        1 => Just(StoreOp::Clear),
    ]
}

// ============================================================================
// Helpers
// ============================================================================

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn drain(rx: &mut broadcast::Receiver<Snapshot>) -> Vec<Snapshot> {
    let mut out = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        out.push(snapshot);
    }
    out
}

fn loading_count(messages: &[Message]) -> usize {
    messages.iter().filter(|m| m.is_loading).count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_turn_invariants_hold(ops in proptest::collection::vec(arb_op(), 1..12)) {
        let rt = runtime();
        let generator = Arc::new(MockGenerator::new());
        let mut conv = Conversation::new("prop", generator.clone());
        let mut rx = conv.subscribe();

        for op in ops {
            let before = conv.messages();
            match op {
                Op::Submit { text, fails } => {
                    let trimmed = text.trim().to_string();
                    if !trimmed.is_empty() {
                        if fails {
                            generator.queue_error(GenerateError::unknown("scripted failure"));
                        } else {
                            generator.queue_reply("scripted reply");
                        }
                    }

                    let outcome = rt.block_on(conv.submit(&text)).unwrap();
                    let snapshots = drain(&mut rx);
                    let after = conv.messages();

                    if trimmed.is_empty() {
                        prop_assert_eq!(outcome, TurnOutcome::Ignored);
                        prop_assert!(snapshots.is_empty());
                        prop_assert_eq!(after, before);
                        continue;
                    }

                    // One snapshot per transition; failures pass through Failed
                    let expected = if fails { 4 } else { 3 };
                    prop_assert_eq!(snapshots.len(), expected);
                    prop_assert_eq!(snapshots.last().map(|s| s.phase), Some(TurnPhase::Resolved));
                    for s in &snapshots {
                        prop_assert!(loading_count(&s.messages) <= 1);
                    }

                    // The user message lands first, trimmed
                    let first = &snapshots[0].messages;
                    prop_assert_eq!(first.len(), before.len() + 1);
                    let user = first.last().unwrap();
                    prop_assert_eq!(user.sender, Sender::User);
                    prop_assert_eq!(&user.content, &trimmed);

                    // Placeholder visible while waiting
                    prop_assert_eq!(loading_count(&snapshots[1].messages), 1);

                    // Net effect: user + agent appended after the old history
                    prop_assert_eq!(after.len(), before.len() + 2);
                    prop_assert_eq!(&after[..before.len()], &before[..]);
                    prop_assert_eq!(loading_count(&after), 0);
                    let agent = after.last().unwrap();
                    prop_assert_eq!(agent.sender, Sender::Agent);
                    if fails {
                        prop_assert_eq!(outcome, TurnOutcome::Failed);
                        prop_assert_eq!(agent.content.as_str(), ERROR_REPLY);
                    } else {
                        prop_assert_eq!(outcome, TurnOutcome::Replied);
                        prop_assert_eq!(agent.content.as_str(), "scripted reply");
                    }
                    prop_assert_eq!(conv.phase(), TurnPhase::Resolved);
                }
                Op::Clear => {
                    conv.clear();
                    let snapshots = drain(&mut rx);
                    prop_assert_eq!(snapshots.len(), 1);
                    prop_assert!(conv.messages().is_empty());
                    prop_assert_eq!(conv.phase(), TurnPhase::Idle);
                }
            }
        }
    }

    #[test]
    fn prop_store_matches_model(ops in proptest::collection::vec(arb_store_op(), 0..40)) {
        let mut store = MessageStore::new();
        let mut model: Vec<Message> = Vec::new();

        for op in ops {
            match op {
                StoreOp::Append(text, user) => {
                    let sender = if user { Sender::User } else { Sender::Agent };
                    let m = store.append(text.clone(), sender);
                    prop_assert_eq!(&m.content, &text);
                    prop_assert!(!m.is_loading);
                    model.push(m);
                }
                StoreOp::AppendLoading => {
                    let m = store.append_loading();
                    prop_assert!(m.is_loading);
                    prop_assert!(m.content.is_empty());
                    model.push(m);
                }
                StoreOp::RemoveAt(i) => {
                    if let Some(target) = model.get(i).cloned() {
                        prop_assert!(store.remove(&target.id));
                        model.retain(|m| m.id != target.id);
                    }
                }
                StoreOp::RemoveMissing => {
                    prop_assert!(!store.remove("no-such-id"));
                }
                StoreOp::Clear => {
                    store.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(store.list(), model.clone());
            prop_assert_eq!(store.len(), model.len());
        }
    }
}
