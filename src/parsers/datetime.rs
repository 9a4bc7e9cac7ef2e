use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Two-digit years up to this value belong to the 2000s, the rest to the 1900s
const TWO_DIGIT_YEAR_PIVOT: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Accepts "AM", "pm", "a.m.", "p. m." and similar spellings
    pub fn parse(text: &str) -> Option<Self> {
        let letters: String =
            text.chars().filter(|c| c.is_ascii_alphabetic()).collect::<String>().to_lowercase();
        match letters.as_str() {
            "am" => Some(Meridiem::Am),
            "pm" => Some(Meridiem::Pm),
            _ => None,
        }
    }
}

pub fn expand_year(raw: &str) -> Option<i32> {
    let value: i32 = raw.parse().ok()?;
    match raw.len() {
        2 if value <= TWO_DIGIT_YEAR_PIVOT => Some(2000 + value),
        2 => Some(1900 + value),
        4 => Some(value),
        _ => None,
    }
}

/// Assemble a timestamp from captured components, rejecting impossible dates
pub fn build_timestamp(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
    second: Option<&str>,
    meridiem: Option<Meridiem>,
) -> Option<NaiveDateTime> {
    let year = expand_year(year)?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    let second: u32 = match second {
        Some(s) => s.parse().ok()?,
        None => 0,
    };

    if let Some(meridiem) = meridiem {
        if !(1..=12).contains(&hour) {
            return None;
        }
        hour = match (meridiem, hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        };
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(NaiveDateTime::new(date, time))
}
