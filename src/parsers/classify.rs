//! Media placeholders and system notices.

use crate::models::MessageKind;

const EDITED_MARKER: &str = "<This message was edited>";

/// Left-to-right mark that iOS exports put in front of placeholders and notices
const LRM: char = '\u{200e}';

const MEDIA_MARKERS: &[&str] = &[
    "<media omitted>",
    "image omitted",
    "video omitted",
    "audio omitted",
    "document omitted",
    "sticker omitted",
    "gif omitted",
    "contact card omitted",
    "location omitted",
    "this message was deleted",
    "you deleted this message",
    "null",
];

const SYSTEM_MARKERS: &[&str] = &[
    "messages and calls are end-to-end encrypted",
    "messages to this group are now secured with end-to-end encryption",
    "created group",
    "changed the subject",
    "changed this group's icon",
    "changed the group description",
    "joined using this group's invite link",
    "changed their phone number",
    " added ",
    " removed ",
    " left",
];

/// Remove the edit marker and the invisible direction marks around a body
pub fn clean_body(body: &str) -> String {
    let body = body.trim_end();
    let body = body.strip_suffix(EDITED_MARKER).unwrap_or(body);
    body.trim_matches(|c: char| c == LRM || c.is_whitespace()).to_string()
}

/// Classify a message that carried a `Sender:` part.
///
/// iOS exports write group notices as if the group itself sent them, marked
/// with a leading left-to-right mark.
pub fn classify_body(raw_body: &str, cleaned: &str) -> MessageKind {
    let lower = cleaned.to_lowercase();
    if MEDIA_MARKERS
        .iter()
        .any(|marker| lower == *marker || (marker.ends_with("omitted") && lower.ends_with(marker)))
    {
        return MessageKind::Media;
    }
    if lower.contains("end-to-end encrypt") {
        return MessageKind::System;
    }
    if raw_body.trim_start().starts_with(LRM) && is_system_notice(&lower) {
        return MessageKind::System;
    }
    MessageKind::Text
}

pub fn is_system_notice(lower: &str) -> bool {
    let padded = format!(" {lower}");
    SYSTEM_MARKERS.iter().any(|marker| padded.contains(marker))
}
