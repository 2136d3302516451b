//! pilot-client: HTTP access to the sales agent backend
//!
//! This crate provides the streaming chat endpoint together with the
//! incremental decoder for its event stream, and typed wrappers for the
//! knowledge-base, rule, plan, connection and service endpoints.

pub mod api;
pub mod client;
pub mod decoder;
pub mod error;
pub mod event;
pub mod types;

pub use client::{AgentClient, DEFAULT_BASE_URL};
pub use decoder::{ByteStream, DATA_PREFIX, Decoded, EventDecoder, decode_stream};
pub use error::{Error, Result};
pub use event::ServerEvent;
pub use types::*;
