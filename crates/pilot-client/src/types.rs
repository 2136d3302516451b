//! Request and response payloads shared across endpoints

use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat/stream`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Lets the agent send routine mail without asking for a draft review
    pub hands_free: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, hands_free: bool) -> Self {
        Self {
            message: message.into(),
            hands_free,
        }
    }
}

/// Who authored a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the backend's server-side conversation memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Generic acknowledgement returned by mutating endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub success: bool,
    pub message: Option<String>,
}
