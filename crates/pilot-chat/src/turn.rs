//! A single chat turn: one user message and the agent's streamed response

use chrono::{DateTime, Utc};
use pilot_client::ServerEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trace::ReasoningTrace;

/// Where a turn is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Created, request not issued yet
    Pending,
    /// Request issued, waiting for the response stream to open
    Sending,
    /// Reading the response stream
    Streaming,
    /// The stream ended normally
    Completed,
    /// The request could not be opened or the stream broke off
    Failed(String),
}

impl TurnStatus {
    /// `Completed` and `Failed` never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStatus::Completed | TurnStatus::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    id: Uuid,
    user_text: String,
    started_at: DateTime<Utc>,
    trace: ReasoningTrace,
    step_errors: Vec<String>,
    dropped_records: u32,
    status: TurnStatus,
}

impl ChatTurn {
    pub fn new(user_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_text: user_text.into(),
            started_at: Utc::now(),
            trace: ReasoningTrace::new(),
            step_errors: Vec::new(),
            dropped_records: 0,
            status: TurnStatus::Pending,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn trace(&self) -> &ReasoningTrace {
        &self.trace
    }

    /// Recoverable errors the backend reported while the turn ran
    pub fn step_errors(&self) -> &[String] {
        &self.step_errors
    }

    /// Records skipped because their payload could not be parsed
    pub fn dropped_records(&self) -> u32 {
        self.dropped_records
    }

    pub fn status(&self) -> &TurnStatus {
        &self.status
    }

    pub(crate) fn set_status(&mut self, status: TurnStatus) {
        debug_assert!(!self.status.is_terminal(), "turn {} already finished", self.id);
        tracing::debug!("Turn {}: {:?} -> {:?}", self.id, self.status, status);
        self.status = status;
    }

    /// Route one stream event into the trace (or the step-error list).
    pub(crate) fn apply(&mut self, event: ServerEvent) {
        if self.status.is_terminal() {
            tracing::warn!("Ignoring {} event for finished turn {}", event.kind(), self.id);
            return;
        }
        match event {
            ServerEvent::Thought { content } => {
                self.trace.record_thought(content);
            }
            ServerEvent::Action {
                tool_name,
                tool_input,
            } => {
                self.trace.record_action(tool_name, tool_input);
            }
            ServerEvent::Observation { content } => {
                self.trace.record_observation(content);
            }
            ServerEvent::FinalAnswer { content } => {
                self.trace.set_final_answer(content);
            }
            ServerEvent::Error { content } => self.step_errors.push(content),
        }
    }

    pub(crate) fn record_dropped(&mut self) {
        self.dropped_records += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_routes_events() {
        let mut turn = ChatTurn::new("what does it cost?");
        turn.set_status(TurnStatus::Streaming);
        turn.apply(ServerEvent::thought("checking inventory"));
        turn.apply(ServerEvent::action("search_kb", json!({"q": "pricing"})));
        turn.apply(ServerEvent::error("rate limited, retrying"));
        turn.apply(ServerEvent::observation("3 docs found"));
        turn.apply(ServerEvent::final_answer("Price is $20"));

        let trace = turn.trace();
        assert_eq!(trace.thoughts(), ["checking inventory"]);
        assert_eq!(trace.observation_for(1).unwrap().content, "3 docs found");
        assert_eq!(trace.final_answer(), Some("Price is $20"));
        assert_eq!(turn.step_errors(), ["rate limited, retrying"]);
    }

    #[test]
    fn test_finished_turn_ignores_late_events() {
        let mut turn = ChatTurn::new("hi");
        turn.set_status(TurnStatus::Completed);
        turn.apply(ServerEvent::thought("too late"));
        assert!(turn.trace().is_empty());
    }

    #[test]
    fn test_terminal_states() {
        assert!(TurnStatus::Completed.is_terminal());
        assert!(TurnStatus::Failed("x".into()).is_terminal());
        assert!(!TurnStatus::Streaming.is_terminal());
        assert!(!TurnStatus::Pending.is_terminal());
    }
}
