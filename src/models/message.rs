use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary text written by a participant
    Text,
    /// Attachment placeholders and deleted-message stubs
    Media,
    /// Lines emitted by the chat app itself (joins, encryption notices, ...)
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    /// Sender exactly as written in the export; empty for system lines
    pub sender: String,
    pub body: String,
    pub kind: MessageKind,
}

impl Message {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn is_text(&self) -> bool {
        self.kind == MessageKind::Text
    }
}
