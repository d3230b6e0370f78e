//! Chat messages as supplied by the message source

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// A chat message together with its thread replies
///
/// Messages are immutable once fetched. Ids are opaque, unique within a batch
/// and monotonic by arrival time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque message identifier
    pub id: String,

    /// Message body
    pub text: String,

    /// Epoch seconds, possibly with a fractional part (e.g. `"1705312800.000200"`)
    pub timestamp_epoch_seconds: String,

    /// Author identifier
    pub author_id: String,

    /// Display name of the author, when the source knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Replies in original arrival order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thread_replies: Vec<Message>,
}

impl Message {
    /// Create a message without author name or replies
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        timestamp_epoch_seconds: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp_epoch_seconds: timestamp_epoch_seconds.into(),
            author_id: author_id.into(),
            author_name: None,
            thread_replies: Vec::new(),
        }
    }

    /// Set the author display name
    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self
    }

    /// Append a thread reply
    pub fn with_reply(mut self, reply: Message) -> Self {
        self.thread_replies.push(reply);
        self
    }

    /// UTC calendar date (`YYYY-MM-DD`) of this message, if the timestamp parses
    pub fn date(&self) -> Option<String> {
        epoch_to_date(&self.timestamp_epoch_seconds)
    }
}

/// Convert an epoch-seconds string to a UTC `YYYY-MM-DD` date
///
/// Only the integral part is used; anything after a `.` is ignored.
///
/// # Examples
///
/// ```
/// use shipnotes_domain::epoch_to_date;
///
/// assert_eq!(epoch_to_date("1705312800.000200").as_deref(), Some("2024-01-15"));
/// assert_eq!(epoch_to_date("not a number"), None);
/// ```
pub fn epoch_to_date(epoch_seconds: &str) -> Option<String> {
    let whole = epoch_seconds.trim().split('.').next()?;
    let secs: i64 = whole.parse().ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_to_date_integral() {
        assert_eq!(epoch_to_date("0").as_deref(), Some("1970-01-01"));
        assert_eq!(epoch_to_date("1705312800").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_epoch_to_date_is_utc() {
        // 2024-01-15T23:59:59Z
        assert_eq!(epoch_to_date("1705363199.999").as_deref(), Some("2024-01-15"));
        // 2024-01-16T00:00:00Z
        assert_eq!(epoch_to_date("1705363200").as_deref(), Some("2024-01-16"));
    }

    #[test]
    fn test_epoch_to_date_invalid() {
        assert_eq!(epoch_to_date(""), None);
        assert_eq!(epoch_to_date("abc"), None);
    }

    #[test]
    fn test_message_deserializes_camel_case() {
        let json = r#"{
            "id": "m1",
            "text": "Shipped v2",
            "timestampEpochSeconds": "1705312800.000100",
            "authorId": "U123",
            "threadReplies": [
                {
                    "id": "r1",
                    "text": "nice",
                    "timestampEpochSeconds": "1705312900",
                    "authorId": "U9",
                    "authorName": "Bo"
                }
            ]
        }"#;

        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, "m1");
        assert_eq!(message.author_name, None);
        assert_eq!(message.thread_replies.len(), 1);
        assert_eq!(message.thread_replies[0].author_name.as_deref(), Some("Bo"));
        assert_eq!(message.date().as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_builder_helpers() {
        let message = Message::new("m1", "hello", "0", "U1")
            .with_author_name("Ada")
            .with_reply(Message::new("r1", "hi", "60", "U2"));

        assert_eq!(message.author_name.as_deref(), Some("Ada"));
        assert_eq!(message.thread_replies[0].id, "r1");
    }
}
