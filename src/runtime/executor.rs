//! Conversation runtime executor

use super::{Event, RuntimeError};
use crate::chat::{Conversation, PendingTurn, TurnOutcome};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

type SubmitReply = oneshot::Sender<Result<TurnOutcome, RuntimeError>>;

/// The turn currently waiting on the generator
struct InFlight {
    turn_id: u64,
    turn: PendingTurn,
    cancel: CancellationToken,
    reply: SubmitReply,
}

/// Owns one conversation and applies every command to it in order.
///
/// Generation runs in a spawned task so commands keep flowing while a reply
/// is outstanding. A clear cancels that task and nothing it produces is
/// recorded.
///
/// The runtime only keeps a weak sender to itself, so it stops when the last
/// handle is dropped. With an idle timeout it also stops after that long
/// without events, unless a turn is in flight or someone is subscribed.
pub struct ConversationRuntime {
    conversation: Conversation,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::WeakSender<Event>,
    idle_timeout: Option<Duration>,
    in_flight: Option<InFlight>,
    next_turn_id: u64,
}

impl ConversationRuntime {
    pub fn new(
        conversation: Conversation,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
    ) -> Self {
        Self {
            conversation,
            event_rx,
            event_tx,
            idle_timeout: None,
            in_flight: None,
            next_turn_id: 1,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.conversation.id(), "Starting conversation runtime");

        loop {
            let event = match self.idle_timeout {
                Some(idle) => match tokio::time::timeout(idle, self.event_rx.recv()).await {
                    Ok(event) => event,
                    Err(_) if self.is_idle() => {
                        tracing::info!(conv_id = %self.conversation.id(), "Conversation idle, shutting down");
                        break;
                    }
                    Err(_) => continue,
                },
                None => self.event_rx.recv().await,
            };
            // All handles dropped
            let Some(event) = event else { break };
            self.process_event(event);
        }

        self.abort_in_flight();
        tracing::info!(conv_id = %self.conversation.id(), "Conversation runtime stopped");
    }

    fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.conversation.subscriber_count() == 0
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::UserMessage { text, reply } => self.handle_user_message(&text, reply),
            Event::Clear { reply } => {
                self.abort_in_flight();
                self.conversation.clear();
                let _ = reply.send(());
            }
            Event::GetSnapshot { reply } => {
                let _ = reply.send(self.conversation.snapshot());
            }
            Event::GenerationComplete { turn_id, result } => {
                self.handle_generation_complete(turn_id, result);
            }
        }
    }

    fn handle_user_message(&mut self, text: &str, reply: SubmitReply) {
        if self.in_flight.is_some() && !text.trim().is_empty() {
            let _ = reply.send(Err(RuntimeError::Busy));
            return;
        }

        let turn = match self.conversation.begin_turn(text) {
            Ok(Some(turn)) => turn,
            Ok(None) => {
                let _ = reply.send(Ok(TurnOutcome::Ignored));
                return;
            }
            Err(_) => {
                let _ = reply.send(Err(RuntimeError::Busy));
                return;
            }
        };

        let turn_id = self.next_turn_id;
        self.next_turn_id += 1;
        let cancel = CancellationToken::new();

        self.spawn_generation(turn_id, &turn, cancel.clone());
        self.in_flight = Some(InFlight {
            turn_id,
            turn,
            cancel,
            reply,
        });
    }

    fn spawn_generation(&self, turn_id: u64, turn: &PendingTurn, cancel: CancellationToken) {
        let generator = self.conversation.generator();
        let request = turn.request().clone();
        // Upgraded for the task's lifetime so the reply can always be delivered
        let Some(event_tx) = self.event_tx.upgrade() else {
            return;
        };

        tokio::spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = generator.generate(&request) => result,
            };
            let _ = event_tx
                .send(Event::GenerationComplete { turn_id, result })
                .await;
        });
    }

    fn handle_generation_complete(
        &mut self,
        turn_id: u64,
        result: Result<String, crate::chat::GenerateError>,
    ) {
        let is_current = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.turn_id == turn_id);
        if !is_current {
            tracing::debug!(
                conv_id = %self.conversation.id(),
                turn_id,
                "Ignoring reply for an abandoned turn"
            );
            return;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };

        let outcome = self.conversation.finish_turn(in_flight.turn, result);
        let _ = in_flight.reply.send(Ok(outcome));
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::info!(
                conv_id = %self.conversation.id(),
                turn_id = in_flight.turn_id,
                "Cancelling in-flight reply"
            );
            in_flight.cancel.cancel();
            let _ = in_flight.reply.send(Ok(TurnOutcome::Discarded));
        }
    }
}
