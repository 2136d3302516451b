//! Incremental decoder for the newline-delimited chat event stream
//!
//! Records are separated by `\n`. A record is either empty or starts with
//! [`DATA_PREFIX`] followed by a JSON object; anything else is dropped. Bytes
//! are buffered until a full line is available, so a payload (or a multi-byte
//! character) split across network chunks decodes the same as if it had
//! arrived in one piece.

use std::pin::Pin;

use async_stream::stream;
use bytes::Bytes;
use futures::StreamExt;
use tokio_stream::Stream;

use crate::{
    error::{Error, Result},
    event::{ServerEvent, WireRecord},
};

/// Marker that introduces a data record
pub const DATA_PREFIX: &str = "data: ";

/// A raw response body: chunks in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Outcome of decoding one data record
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(ServerEvent),
    /// The record carried the data marker but its payload was not valid JSON
    /// (or not a recognizable record). Callers keep reading.
    Malformed { reason: String },
}

/// Splits byte chunks into records and parses them.
///
/// The only state is the trailing partial line.
#[derive(Debug, Default)]
pub struct EventDecoder {
    pending: Vec<u8>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk and return everything that completed in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        self.pending.extend_from_slice(chunk);

        let mut out = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(decoded) = decode_line(&self.pending[start..end]) {
                out.push(decoded);
            }
            start = end + 1;
        }
        self.pending.drain(..start);
        out
    }

    /// Flush the trailing partial line once the stream has ended.
    pub fn finish(&mut self) -> Vec<Decoded> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest).into_iter().collect()
    }
}

/// Decode one record without its terminator.
fn decode_line(raw: &[u8]) -> Option<Decoded> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }

    let line = String::from_utf8_lossy(raw);
    let payload = line.strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str::<WireRecord>(payload) {
        Ok(record) => record.into_event().map(Decoded::Event),
        Err(e) => {
            tracing::warn!("Dropping malformed stream record: {}", e);
            Some(Decoded::Malformed {
                reason: e.to_string(),
            })
        }
    }
}

/// Adapt a body stream into a lazy sequence of decoded records.
///
/// A read error is yielded once and ends the sequence; a clean end of data
/// flushes any trailing partial record first.
pub fn decode_stream(mut body: ByteStream) -> impl Stream<Item = Result<Decoded>> + Send {
    stream! {
        let mut decoder = EventDecoder::new();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for decoded in decoder.feed(&bytes) {
                        yield Ok(decoded);
                    }
                }
                Err(e) => {
                    yield Err(match e {
                        Error::Http(http) => Error::Stream(http.to_string()),
                        other => other,
                    });
                    return;
                }
            }
        }

        for decoded in decoder.finish() {
            yield Ok(decoded);
        }
    }
}
