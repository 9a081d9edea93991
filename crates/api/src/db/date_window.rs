use time::{macros::format_description, Date, Duration};

use super::Error;

/// Fixed day count subtracted from the latest date; not a calendar-year step.
pub const DAYS_IN_WINDOW: i64 = 365;

/// Inclusive `[start, end]` window of `YYYY-MM-DD` dates ending at the latest measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    pub start: String,
    pub end: String,
}

impl DateWindow {
    pub fn ending_at(latest: &str) -> Result<Self, Error> {
        let end = parse_date(latest)?;
        let start = end.saturating_sub(Duration::days(DAYS_IN_WINDOW));

        Ok(Self {
            start: start.format(format_description!("[year]-[month]-[day]"))?,
            end: latest.to_owned(),
        })
    }

    /// Lexicographic bounds check, valid because ISO dates sort chronologically
    pub fn contains(&self, date: &str) -> bool {
        self.start.as_str() <= date && date <= self.end.as_str()
    }
}

fn parse_date(value: &str) -> Result<Date, Error> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|source| {
        Error::MalformedDate {
            value: value.to_owned(),
            source,
        }
    })
}
