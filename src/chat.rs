//! Chat core: message store, reply generation and the turn orchestrator

mod agent;
mod booking;
mod conversation;
mod error;
mod generator;
mod message;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use agent::Agent;
pub use booking::BookingApiResponder;
#[allow(unused_imports)] // Public API re-exports
pub use conversation::{
    Conversation, ConversationError, PendingTurn, Snapshot, TurnOutcome, TurnPhase, ERROR_REPLY,
};
#[allow(unused_imports)]
pub use error::{GenerateError, GenerateErrorKind};
#[allow(unused_imports)]
pub use generator::{
    CannedResponder, GenerateRequest, LoggingGenerator, ResponseGenerator, CANNED_RESPONSES,
};
#[allow(unused_imports)]
pub use message::{Message, MessageStore, Sender};
