//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::TempDir;

/// Builds a transcript in the US 12-hour dashed export layout
#[derive(Default)]
pub struct TranscriptBuilder {
    lines: Vec<String>,
}

impl TranscriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message sent at `when` (`YYYY-MM-DD HH:MM`)
    pub fn message(mut self, when: &str, sender: &str, body: &str) -> Self {
        let timestamp =
            NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M").expect("Invalid test timestamp");
        self.lines.push(format!("{} - {}: {}", timestamp.format("%-m/%-d/%y, %-I:%M %p"), sender, body));
        self
    }

    /// Add a system notice (no sender)
    pub fn notice(mut self, when: &str, text: &str) -> Self {
        let timestamp =
            NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M").expect("Invalid test timestamp");
        self.lines.push(format!("{} - {}", timestamp.format("%-m/%-d/%y, %-I:%M %p"), text));
        self
    }

    /// Add a raw line, e.g. a continuation of the previous message
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    /// Several participants each say something unrelated on `day`
    pub fn chatter(mut self, day: &str, senders: &[&str]) -> Self {
        for (i, sender) in senders.iter().enumerate() {
            self = self.message(&format!("{} {:02}:{:02}", day, 9 + i / 60, i % 60), sender, "see you later");
        }
        self
    }

    pub fn build(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// The celebration from the README: three wishes and a thanks reply
pub fn sarah_celebration(builder: TranscriptBuilder, day: &str) -> TranscriptBuilder {
    builder
        .message(&format!("{} 15:00", day), "Alice", "Happy birthday!!🎂")
        .message(&format!("{} 15:20", day), "Bob", "HBD Sarah")
        .message(&format!("{} 15:40", day), "Carol", "wish you the best")
        .message(&format!("{} 16:00", day), "Sarah", "Thank you all!")
}

/// Temporary directory holding transcript files
pub struct TranscriptDir {
    temp_dir: TempDir,
}

impl TranscriptDir {
    pub fn new() -> Self {
        Self { temp_dir: TempDir::new().expect("Failed to create temp dir") }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn with_file(self, name: &str, content: &str) -> Self {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(path, content).expect("Failed to write transcript");
        self
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}
