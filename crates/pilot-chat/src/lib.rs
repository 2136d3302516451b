//! pilot-chat: streaming chat sessions with the sales agent
//!
//! This crate accumulates the agent's streamed reasoning into a per-turn
//! trace, renders it as HTML, and drives turns through a transport while
//! keeping the session's history.

pub mod error;
pub mod events;
pub mod handle;
pub mod render;
pub mod session;
pub mod trace;
pub mod transport;
pub mod turn;

pub use error::{Error, Result};
pub use events::SessionEvent;
pub use handle::{BusyGuard, SessionHandle};
pub use render::{ExpansionOverrides, render_bubble, render_trace};
pub use session::{ChatSession, RenderTarget};
pub use trace::{Action, Observation, ReasoningTrace};
pub use transport::{ChatTransport, HttpTransport};
pub use turn::{ChatTurn, TurnStatus};
