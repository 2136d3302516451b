//! Session event types

use pilot_client::ServerEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::turn::TurnStatus;

/// Events emitted while a session processes a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was accepted and a turn created
    TurnStart { turn_id: Uuid, message: String },

    /// The response stream is open
    StreamOpen { turn_id: Uuid },

    /// A stream event was applied to the trace
    TraceUpdated {
        turn_id: Uuid,
        /// Sequence number of the latest action after applying the event
        sequence: u32,
        event: ServerEvent,
    },

    /// The backend reported a recoverable step error
    StepError { turn_id: Uuid, message: String },

    /// A record was skipped because its payload did not parse
    RecordDropped { turn_id: Uuid, reason: String },

    /// The turn reached `Completed` or `Failed`
    TurnEnd { turn_id: Uuid, status: TurnStatus },
}
