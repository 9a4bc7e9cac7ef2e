/// Transcript parsing tests across export layouts
mod common;

use chat_birthdays::config::ParserConfig;
use chat_birthdays::models::MessageKind;
use chat_birthdays::parsers::{LineFormat, parse_transcript};
use chat_birthdays::{AnalysisConfig, analyze};
use chrono::{NaiveDate, Timelike};
use common::TranscriptBuilder;

#[test]
fn test_every_layout_is_detected() {
    for format in LineFormat::ALL {
        let text = format!("{}\nand many more\n{}\n", format.example(), format.example());
        let transcript = parse_transcript(&text, &ParserConfig::default())
            .unwrap_or_else(|e| panic!("{} failed: {}", format, e));

        assert_eq!(transcript.format, format);
        assert_eq!(transcript.messages.len(), 2, "{}", format);

        let first = &transcript.messages[0];
        assert_eq!(first.sender, "Sarah");
        assert_eq!(first.body, "Happy birthday!\nand many more");
        assert_eq!(first.timestamp.date(), NaiveDate::from_ymd_opt(2024, 4, 26).unwrap());
        assert_eq!((first.timestamp.hour(), first.timestamp.minute()), (15, 5));
    }
}

#[test]
fn test_notices_and_media_are_classified() {
    let text = TranscriptBuilder::new()
        .notice(
            "2024-01-01 09:00",
            "Messages and calls are end-to-end encrypted. No one outside of this chat can read them.",
        )
        .message("2024-01-01 09:05", "Alice", "<Media omitted>")
        .message("2024-01-01 09:06", "Bob", "Happy new year <This message was edited>")
        .build();

    let transcript = parse_transcript(&text, &ParserConfig::default()).unwrap();
    let kinds: Vec<MessageKind> = transcript.messages.iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![MessageKind::System, MessageKind::Media, MessageKind::Text]);
    assert_eq!(transcript.messages[0].sender, "");
    assert_eq!(transcript.messages[2].body, "Happy new year");
}

#[test]
fn test_text_before_first_message_is_counted_as_orphan() {
    let text = format!("exported from phone\n{}", LineFormat::IsoDashed.example());
    let transcript = parse_transcript(&text, &ParserConfig::default()).unwrap();

    assert_eq!(transcript.orphan_lines, 1);
    assert_eq!(transcript.messages.len(), 1);
}

#[test]
fn test_day_first_export_end_to_end() {
    let text = "\
26/04/2024, 15:00 - Alice: Happy birthday!!🎂
26/04/2024, 15:20 - Bob: HBD Sarah
26/04/2024, 15:40 - Carol: wish you the best
26/04/2024, 16:00 - Sarah: Thank you all!
";

    let entities = analyze(text, &AnalysisConfig::default()).unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].target.as_ref().unwrap().display_name, "Sarah");
}

#[test]
fn test_media_is_never_a_wish() {
    let text = TranscriptBuilder::new()
        .message("2024-02-02 10:00", "Alice", "<Media omitted>")
        .message("2024-02-02 10:01", "Bob", "<Media omitted>")
        .message("2024-02-02 10:02", "Carol", "sticker omitted")
        .build();

    assert!(analyze(&text, &AnalysisConfig::default()).unwrap().is_empty());
}
