//! Wire protocol for the chat socket.
//!
//! Inbound frames are JSON text with an optional `type` discriminator, or
//! plain free text. Decoding happens exactly once, here, at the connection
//! boundary; everything downstream works with `ServerFrame`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a transcript message.
///
/// The backend has written both `"assistant"` and `"system"` for the
/// non-user side; either deserializes to `Assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    #[serde(alias = "system")]
    Assistant,
}

/// One entry of a `history` frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub author: Author,
    pub content: String,
}

/// Frames that carry an explicit `type` discriminator.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedFrame {
    /// Full conversation snapshot, replaces the transcript.
    History { messages: Vec<HistoryEntry> },
    /// The backend started a fresh session; the transcript must be cleared.
    NewSession {
        #[serde(default)]
        conversation_id: Option<i64>,
        #[serde(default)]
        message: Option<String>,
    },
    /// The current streamed response is complete.
    StreamEnd,
    /// Transient backend status note while it searches and summarizes.
    Think { message: String },
}

/// An inbound frame, decoded once at the connection boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    History(Vec<HistoryEntry>),
    NewSession,
    StreamEnd,
    Think(String),
    /// JSON that decoded but carried no recognized `type`; rendered as text.
    RawObject(Value),
    /// Plain free text, one streamed chunk of the in-progress response.
    Chunk(String),
}

/// Classify one raw text frame.
///
/// Malformed JSON is not an error: free-text chunks have no `type` field and
/// usually aren't JSON at all, so the fallback is the chunk path.
pub fn decode_frame(raw: &str) -> ServerFrame {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return ServerFrame::Chunk(raw.to_string()),
    };

    match serde_json::from_value::<TaggedFrame>(value.clone()) {
        Ok(TaggedFrame::History { messages }) => ServerFrame::History(messages),
        Ok(TaggedFrame::NewSession { .. }) => ServerFrame::NewSession,
        Ok(TaggedFrame::StreamEnd) => ServerFrame::StreamEnd,
        Ok(TaggedFrame::Think { message }) => ServerFrame::Think(message),
        Err(_) => ServerFrame::RawObject(value),
    }
}

/// An outgoing payload: raw text, or an object serialized to JSON text.
#[derive(Debug, Clone)]
pub enum Outgoing {
    Text(String),
    #[allow(dead_code)]
    Json(Value),
}

impl Outgoing {
    pub fn into_wire(self) -> String {
        match self {
            Outgoing::Text(text) => text,
            Outgoing::Json(value) => value.to_string(),
        }
    }
}
