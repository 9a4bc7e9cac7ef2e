use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::classify::{classify_body, clean_body};
use super::formats::{LineFormat, detect_format, split_sender};
use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::models::{Message, MessageKind};
use crate::utils::validate_file_size;

const BOM: char = '\u{feff}';
const LRM: char = '\u{200e}';

/// A parsed export: the chosen line format and the messages in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub format: LineFormat,
    pub messages: Vec<Message>,
    /// Non-empty lines before the first message
    pub orphan_lines: usize,
}

impl Transcript {
    pub fn text_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_text())
    }
}

/// Message under construction; continuation lines are appended to `raw_body`
struct PendingMessage {
    timestamp: NaiveDateTime,
    sender: Option<String>,
    raw_body: String,
}

impl PendingMessage {
    fn finish(self, index: usize) -> Message {
        let body = clean_body(&self.raw_body);
        let (sender, kind) = match self.sender {
            Some(sender) => {
                let kind = classify_body(&self.raw_body, &body);
                (sender, kind)
            }
            None => (String::new(), MessageKind::System),
        };
        Message { index, timestamp: self.timestamp, sender, body, kind }
    }
}

fn normalize_line(line: &str) -> &str {
    line.trim_start_matches([BOM, LRM]).trim_end()
}

/// Parse a chat export into messages.
///
/// # Errors
///
/// - [`ParseError::Empty`] when the text has no non-empty lines
/// - [`ParseError::UnrecognizedFormat`] when no sampled line matches any
///   [`LineFormat`]
pub fn parse_transcript(text: &str, config: &ParserConfig) -> Result<Transcript, ParseError> {
    let sample: Vec<&str> = text
        .lines()
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .take(config.sample_lines.max(1))
        .collect();
    if sample.is_empty() {
        return Err(ParseError::Empty);
    }

    let format = detect_format(sample.iter().copied())
        .ok_or(ParseError::UnrecognizedFormat { sampled: sample.len() })?;
    debug!(format = %format, sampled = sample.len(), "Selected line format");

    let mut messages = Vec::new();
    let mut pending: Option<PendingMessage> = None;
    let mut orphan_lines = 0usize;

    for raw_line in text.lines() {
        let line = normalize_line(raw_line);

        if let Some(header) = format.parse_header(line) {
            if let Some(done) = pending.take() {
                messages.push(done.finish(messages.len()));
            }
            pending = Some(match split_sender(header.rest) {
                Some((sender, body)) => PendingMessage {
                    timestamp: header.timestamp,
                    sender: Some(sender.to_string()),
                    raw_body: body.to_string(),
                },
                None => PendingMessage {
                    timestamp: header.timestamp,
                    sender: None,
                    raw_body: header.rest.to_string(),
                },
            });
            continue;
        }

        match pending.as_mut() {
            Some(current) => {
                current.raw_body.push('\n');
                current.raw_body.push_str(raw_line.trim_end());
            }
            None if !line.is_empty() => orphan_lines += 1,
            None => {}
        }
    }

    if let Some(done) = pending.take() {
        messages.push(done.finish(messages.len()));
    }

    info!(
        format = %format,
        messages = messages.len(),
        orphan_lines,
        "Parsed transcript"
    );

    Ok(Transcript { format, messages, orphan_lines })
}

/// Read an export file from disk.
///
/// Files over the size limit are refused; invalid UTF-8 is replaced rather
/// than rejected since exports from older phones are not always clean.
pub fn read_transcript_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open transcript: {}", path.display()))?;
    validate_file_size(&file, path)?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(text: &str) -> Transcript {
        parse_transcript(text, &ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_simple_transcript() {
        let text = "4/26/24, 3:00 PM - Alice: Happy birthday!!\n\
                    4/26/24, 3:10 PM - Bob: HBD Sarah\n";
        let transcript = parse(text);
        assert_eq!(transcript.format, LineFormat::DashedUs12h);
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].sender, "Alice");
        assert_eq!(transcript.messages[1].body, "HBD Sarah");
        assert_eq!(transcript.messages[1].index, 1);
        assert_eq!(
            transcript.messages[1].timestamp,
            NaiveDate::from_ymd_opt(2024, 4, 26).unwrap().and_hms_opt(15, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_continuation_lines_join_previous_body() {
        let text = "26/04/2024, 15:00 - Alice: Happy birthday\n\
                    have a great year\n\
                    \n\
                    26/04/2024, 15:05 - Bob: hbd";
        let transcript = parse(text);
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].body, "Happy birthday\nhave a great year");
    }

    #[test]
    fn test_orphan_lines_before_first_message() {
        let text = "exported chat\n\n[26/04/2024, 15:00:00] Alice: hi";
        let transcript = parse(text);
        assert_eq!(transcript.orphan_lines, 1);
        assert_eq!(transcript.messages.len(), 1);
    }

    #[test]
    fn test_system_lines_have_no_sender() {
        let text = "26/04/2024, 15:00 - Alice created group \"Family\"\n\
                    26/04/2024, 15:01 - Alice: hi";
        let transcript = parse(text);
        assert_eq!(transcript.messages[0].kind, MessageKind::System);
        assert!(transcript.messages[0].sender.is_empty());
        assert_eq!(transcript.messages[1].kind, MessageKind::Text);
    }

    #[test]
    fn test_media_and_edit_marker() {
        let text = "26/04/2024, 15:00 - Alice: <Media omitted>\n\
                    26/04/2024, 15:01 - Bob: happy bday <This message was edited>";
        let transcript = parse(text);
        assert_eq!(transcript.messages[0].kind, MessageKind::Media);
        assert_eq!(transcript.messages[1].body, "happy bday");
        assert_eq!(transcript.text_messages().count(), 1);
    }

    #[test]
    fn test_bom_and_lrm_are_ignored() {
        let text = "\u{feff}\u{200e}[26/04/2024, 15:00:00] Alice: hi";
        let transcript = parse(text);
        assert_eq!(transcript.format, LineFormat::BracketedDayFirst24h);
        assert_eq!(transcript.messages.len(), 1);
    }

    #[test]
    fn test_sender_passes_through_unchanged() {
        let text = "26/04/2024, 15:00 - Ms - Priya K: hello";
        assert_eq!(parse(text).messages[0].sender, "Ms - Priya K");
    }

    #[test]
    fn test_unrecognized_format() {
        let result = parse_transcript("hello\nworld\n", &ParserConfig::default());
        assert!(matches!(result, Err(ParseError::UnrecognizedFormat { sampled: 2 })));
    }

    #[test]
    fn test_empty_transcript() {
        let result = parse_transcript("\n  \n", &ParserConfig::default());
        assert!(matches!(result, Err(ParseError::Empty)));
    }

    #[test]
    fn test_read_transcript_file_lossy() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"26/04/2024, 15:00 - Alice: caf\xe9").unwrap();
        let text = read_transcript_file(file.path()).unwrap();
        assert!(text.starts_with("26/04/2024"));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_transcript_file(Path::new("/nonexistent/chat.txt")).is_err());
    }
}
