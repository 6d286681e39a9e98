//! Conversation types and state management
//!
//! A conversation is stored as one JSON document:
//!
//! ```json
//! {
//!   "id": "1714558830123",
//!   "messages": [
//!     { "prompt": "Hello", "response": "Hi!", "timestamp": "2024-05-01T10:20:30.123Z" }
//!   ],
//!   "timestamp": "2024-05-01T10:20:30.123Z"
//! }
//! ```

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

/// One prompt/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub prompt: String,
    pub response: String,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Time of the last appended message
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
}

impl Conversation {
    /// Start a conversation with its first exchange
    pub fn new(id: impl Into<String>, first: Message) -> Self {
        Self {
            id: id.into(),
            timestamp: first.timestamp,
            messages: vec![first],
        }
    }

    /// Append an exchange; the document timestamp follows the new message
    pub fn push(&mut self, message: Message) {
        self.timestamp = message.timestamp;
        self.messages.push(message);
    }

    pub fn summary(&self) -> ChatSummary {
        match self.messages.last() {
            Some(last) => ChatSummary {
                id: self.id.clone(),
                last_prompt: last.prompt.clone(),
                last_timestamp: last.timestamp,
            },
            None => ChatSummary {
                id: self.id.clone(),
                last_prompt: String::new(),
                last_timestamp: self.timestamp,
            },
        }
    }
}

/// List-view projection of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub last_prompt: String,
    #[serde(with = "iso8601")]
    pub last_timestamp: DateTime<Utc>,
}

/// Current time at the precision timestamps are stored with
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(Duration::milliseconds(1)).unwrap_or(now)
}

/// Ids double as file names, so only a conservative character set is accepted.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Millisecond-precision RFC 3339 with a `Z` suffix, e.g. `2024-05-01T10:20:30.123Z`
pub mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
