//! Error types for pilot-chat

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using pilot-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a chat session
#[derive(Error, Debug)]
pub enum Error {
    /// Another turn is still in flight on this session handle
    #[error("a message is already being processed")]
    Busy,

    /// The message was empty after trimming
    #[error("message is empty")]
    EmptyMessage,

    #[error("no turn with id {0}")]
    UnknownTurn(Uuid),

    #[error("turn {turn_id} has no action {sequence}")]
    UnknownAction { turn_id: Uuid, sequence: u32 },
}
