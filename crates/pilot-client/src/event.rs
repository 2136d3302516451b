//! Server event types carried by the chat stream

use serde::{Deserialize, Serialize};

/// One step of the agent's reasoning trace, as emitted by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Intermediate reasoning
    Thought { content: String },
    /// Tool invocation
    Action {
        tool_name: String,
        tool_input: serde_json::Value,
    },
    /// Result of the most recent tool invocation
    Observation { content: String },
    /// The agent's answer for this turn
    FinalAnswer { content: String },
    /// Recoverable per-step failure; more events may follow
    Error { content: String },
}

impl ServerEvent {
    pub fn thought(content: impl Into<String>) -> Self {
        Self::Thought {
            content: content.into(),
        }
    }

    pub fn action(tool_name: impl Into<String>, tool_input: serde_json::Value) -> Self {
        Self::Action {
            tool_name: tool_name.into(),
            tool_input,
        }
    }

    pub fn observation(content: impl Into<String>) -> Self {
        Self::Observation {
            content: content.into(),
        }
    }

    pub fn final_answer(content: impl Into<String>) -> Self {
        Self::FinalAnswer {
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }

    /// Wire tag of this event
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Thought { .. } => "thought",
            ServerEvent::Action { .. } => "action",
            ServerEvent::Observation { .. } => "observation",
            ServerEvent::FinalAnswer { .. } => "final_answer",
            ServerEvent::Error { .. } => "error",
        }
    }
}

/// Record payload as it appears on the wire.
///
/// The backend sends every field on every record (`null` where it does not
/// apply), and adds tags such as `complete` that the client does not act on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WireRecord {
    Thought {
        #[serde(default)]
        content: Option<String>,
    },
    Action {
        #[serde(default)]
        tool_name: Option<String>,
        #[serde(default)]
        tool_input: serde_json::Value,
    },
    Observation {
        #[serde(default)]
        content: Option<String>,
    },
    FinalAnswer {
        #[serde(default)]
        content: Option<String>,
    },
    Error {
        #[serde(default)]
        content: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl WireRecord {
    /// Convert to a typed event; `None` for tags the client ignores.
    pub(crate) fn into_event(self) -> Option<ServerEvent> {
        match self {
            WireRecord::Thought { content } => Some(ServerEvent::thought(content.unwrap_or_default())),
            WireRecord::Action {
                tool_name,
                tool_input,
            } => Some(ServerEvent::action(tool_name.unwrap_or_default(), tool_input)),
            WireRecord::Observation { content } => {
                Some(ServerEvent::observation(content.unwrap_or_default()))
            }
            WireRecord::FinalAnswer { content } => {
                Some(ServerEvent::final_answer(content.unwrap_or_default()))
            }
            WireRecord::Error { content } => Some(ServerEvent::error(content.unwrap_or_default())),
            WireRecord::Unknown => None,
        }
    }
}
