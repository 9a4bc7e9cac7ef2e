use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::datetime::{Meridiem, build_timestamp};

/// One chat export dialect, distinguished by date order, clock style and the
/// delimiter between the timestamp and the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// `4/26/24, 3:05 PM - Sender: text`
    DashedUs12h,
    /// `26/04/2024, 15:05 - Sender: text`
    DashedDayFirst24h,
    /// `[4/26/24, 3:05:10 PM] Sender: text`
    BracketedUs12h,
    /// `[26/04/2024, 15:05:10] Sender: text`
    BracketedDayFirst24h,
    /// `2024-04-26 15:05 - Sender: text`
    IsoDashed,
}

/// Timestamp and the remainder of a line that starts a new message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHeader<'a> {
    pub timestamp: NaiveDateTime,
    pub rest: &'a str,
}

impl LineFormat {
    /// Recognizers in selection order
    pub const ALL: [LineFormat; 5] = [
        LineFormat::DashedUs12h,
        LineFormat::DashedDayFirst24h,
        LineFormat::BracketedUs12h,
        LineFormat::BracketedDayFirst24h,
        LineFormat::IsoDashed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LineFormat::DashedUs12h => "dashed_us_12h",
            LineFormat::DashedDayFirst24h => "dashed_day_first_24h",
            LineFormat::BracketedUs12h => "bracketed_us_12h",
            LineFormat::BracketedDayFirst24h => "bracketed_day_first_24h",
            LineFormat::IsoDashed => "iso_dashed",
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            LineFormat::DashedUs12h => "4/26/24, 3:05 PM - Sarah: Happy birthday!",
            LineFormat::DashedDayFirst24h => "26/04/2024, 15:05 - Sarah: Happy birthday!",
            LineFormat::BracketedUs12h => "[4/26/24, 3:05:10 PM] Sarah: Happy birthday!",
            LineFormat::BracketedDayFirst24h => "[26/04/2024, 15:05:10] Sarah: Happy birthday!",
            LineFormat::IsoDashed => "2024-04-26 15:05 - Sarah: Happy birthday!",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            LineFormat::DashedUs12h => dashed_us_12h(),
            LineFormat::DashedDayFirst24h => dashed_day_first_24h(),
            LineFormat::BracketedUs12h => bracketed_us_12h(),
            LineFormat::BracketedDayFirst24h => bracketed_day_first_24h(),
            LineFormat::IsoDashed => iso_dashed(),
        }
    }

    /// Match the leading timestamp of `line`.
    ///
    /// Returns `None` when the line does not start a message in this format,
    /// including lines whose timestamp shape matches but names an impossible
    /// date or time.
    pub fn parse_header<'a>(&self, line: &'a str) -> Option<LineHeader<'a>> {
        let caps = self.regex().captures(line)?;
        let meridiem = match caps.name("ampm") {
            Some(m) => Some(Meridiem::parse(m.as_str())?),
            None => None,
        };
        let timestamp = build_timestamp(
            caps.name("year")?.as_str(),
            caps.name("month")?.as_str(),
            caps.name("day")?.as_str(),
            caps.name("hour")?.as_str(),
            caps.name("minute")?.as_str(),
            caps.name("second").map(|m| m.as_str()),
            meridiem,
        )?;
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        Some(LineHeader { timestamp, rest })
    }

    pub fn matches(&self, line: &str) -> bool {
        self.parse_header(line).is_some()
    }
}

impl fmt::Display for LineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// `\s` is Unicode-aware, so U+00A0 and U+202F in newer exports match it.
const CLOCK: &str = r"(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?";
const MERIDIEM: &str = r"(?P<ampm>[AaPp]\.?\s?[Mm]\.?)";

fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).expect("built-in line pattern is valid")
}

fn dashed_us_12h() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(format!(
            r"^(?P<month>\d{{1,2}})/(?P<day>\d{{1,2}})/(?P<year>\d{{2}}|\d{{4}}),?\s+{CLOCK}\s*{MERIDIEM}\s+-\s+(?P<rest>.*)$"
        ))
    })
}

fn dashed_day_first_24h() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(format!(
            r"^(?P<day>\d{{1,2}})[/.](?P<month>\d{{1,2}})[/.](?P<year>\d{{2}}|\d{{4}}),?\s+{CLOCK}\s+-\s+(?P<rest>.*)$"
        ))
    })
}

fn bracketed_us_12h() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(format!(
            r"^\[(?P<month>\d{{1,2}})/(?P<day>\d{{1,2}})/(?P<year>\d{{2}}|\d{{4}}),?\s+{CLOCK}\s*{MERIDIEM}\]\s*(?P<rest>.*)$"
        ))
    })
}

fn bracketed_day_first_24h() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(format!(
            r"^\[(?P<day>\d{{1,2}})[/.](?P<month>\d{{1,2}})[/.](?P<year>\d{{2}}|\d{{4}}),?\s+{CLOCK}\]\s*(?P<rest>.*)$"
        ))
    })
}

fn iso_dashed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(format!(
            r"^(?P<year>\d{{4}})-(?P<month>\d{{2}})-(?P<day>\d{{2}}),?\s+{CLOCK}\s+-\s+(?P<rest>.*)$"
        ))
    })
}

/// Pick the recognizer for a whole transcript from a sample of lines.
///
/// The first recognizer matching a strict majority of the sample wins. When
/// none does, the recognizer with the most matches is used, earliest on ties.
/// `None` means no sampled line matched any recognizer.
pub fn detect_format<'a, I>(sample: I) -> Option<LineFormat>
where
    I: IntoIterator<Item = &'a str>,
{
    let lines: Vec<&str> = sample.into_iter().collect();
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(LineFormat, usize)> = None;
    for format in LineFormat::ALL {
        let count = lines.iter().filter(|line| format.matches(line)).count();
        if count * 2 > lines.len() {
            return Some(format);
        }
        if count > 0 && best.is_none_or(|(_, c)| count > c) {
            best = Some((format, count));
        }
    }
    best.map(|(format, _)| format)
}

/// Split `Sender: body`. `None` for system lines that carry no sender.
pub fn split_sender(rest: &str) -> Option<(&str, &str)> {
    let (sender, body) = rest.split_once(':')?;
    let sender = sender.trim();
    if sender.is_empty() || sender.chars().count() > 80 {
        return None;
    }
    Some((sender, body.strip_prefix(' ').unwrap_or(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_each_example_parses_in_its_own_format() {
        for format in LineFormat::ALL {
            let header = format.parse_header(format.example());
            assert!(header.is_some(), "{format} failed on its own example");
            assert_eq!(header.unwrap().rest, "Sarah: Happy birthday!");
        }
    }

    #[test]
    fn test_dashed_us_12h() {
        let header = LineFormat::DashedUs12h
            .parse_header("4/26/24, 3:05 PM - Sarah: hi")
            .unwrap();
        assert_eq!(header.timestamp, ts(2024, 4, 26, 15, 5, 0));
    }

    #[test]
    fn test_narrow_no_break_space_before_meridiem() {
        let line = "4/26/24, 3:05\u{202f}PM - Sarah: hi";
        let header = LineFormat::DashedUs12h.parse_header(line).unwrap();
        assert_eq!(header.timestamp, ts(2024, 4, 26, 15, 5, 0));
    }

    #[test]
    fn test_bracketed_day_first_with_seconds() {
        let header = LineFormat::BracketedDayFirst24h
            .parse_header("[26/04/2024, 15:05:10] Sarah: hi")
            .unwrap();
        assert_eq!(header.timestamp, ts(2024, 4, 26, 15, 5, 10));
    }

    #[test]
    fn test_day_first_accepts_dotted_dates() {
        let header = LineFormat::DashedDayFirst24h
            .parse_header("26.04.24, 09:00 - Sarah: hi")
            .unwrap();
        assert_eq!(header.timestamp, ts(2024, 4, 26, 9, 0, 0));
    }

    #[test]
    fn test_invalid_date_is_not_a_header() {
        assert!(LineFormat::DashedDayFirst24h.parse_header("31/02/2024, 10:00 - A: b").is_none());
        assert!(LineFormat::DashedUs12h.parse_header("13/01/24, 1:00 PM - A: b").is_none());
    }

    #[test]
    fn test_continuation_text_is_not_a_header() {
        for format in LineFormat::ALL {
            assert!(!format.matches("see you at 5 - bring cake"));
        }
    }

    #[test]
    fn test_detect_majority() {
        let lines = [
            "26/04/2024, 15:05 - A: one",
            "26/04/2024, 15:06 - B: two",
            "continued text",
        ];
        assert_eq!(detect_format(lines), Some(LineFormat::DashedDayFirst24h));
    }

    #[test]
    fn test_detect_falls_back_to_most_matches() {
        let lines = [
            "2024-04-26 15:05 - A: one",
            "2024-04-26 15:06 - A: two",
            "a",
            "b",
            "c",
            "[26/04/2024, 15:05:10] B: three",
        ];
        assert_eq!(detect_format(lines), Some(LineFormat::IsoDashed));
    }

    #[test]
    fn test_detect_nothing() {
        assert_eq!(detect_format(["hello", "world"]), None);
        assert_eq!(detect_format(std::iter::empty()), None);
    }

    #[test]
    fn test_split_sender() {
        assert_eq!(split_sender("Sarah: hello: there"), Some(("Sarah", "hello: there")));
        assert_eq!(split_sender("+91 95455 98844: hi"), Some(("+91 95455 98844", "hi")));
        assert_eq!(split_sender("Alice added Bob"), None);
        assert_eq!(split_sender("Sarah:"), Some(("Sarah", "")));
    }
}
