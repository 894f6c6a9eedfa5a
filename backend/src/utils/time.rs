//! Clock-time codec and timezone helpers.
//!
//! `to_12h` and `to_24h` are best-effort: input they cannot parse is returned unchanged.
//! Callers pick the direction with [`is_12h`].

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday as ChronoWeekday};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Minutes since midnight for a local timestamp.
pub fn minute_of_day<T: Timelike>(at: &T) -> u32 {
    at.hour() * 60 + at.minute()
}

pub fn local_weekday(at: &DateTime<Tz>) -> ChronoWeekday {
    at.weekday()
}

/// True when the value carries an AM/PM marker.
pub fn is_12h(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    upper.contains("AM") || upper.contains("PM")
}

/// Parses `H:MM` / `HH:MM` into `(hour, minute)`.
pub fn parse_24h(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    (hour <= 23 && minute <= 59).then_some((hour, minute))
}

/// Parses `H:MM AM|PM` into a 24h `(hour, minute)`.
pub fn parse_12h(value: &str) -> Option<(u32, u32)> {
    let (clock, period) = value.trim().rsplit_once(' ')?;
    let (hour, minute) = clock.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let hour = match period.to_ascii_uppercase().as_str() {
        "AM" if hour == 12 => 0,
        "AM" => hour,
        "PM" if hour == 12 => 12,
        "PM" => hour + 12,
        _ => return None,
    };
    Some((hour, minute))
}

fn format_12h(hour: u32, minute: u32) -> String {
    let period = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, period)
}

/// `"13:05"` -> `"1:05 PM"`.
pub fn to_12h(value: &str) -> String {
    match parse_24h(value) {
        Some((hour, minute)) => format_12h(hour, minute),
        None => value.to_string(),
    }
}

/// `"1:05 PM"` -> `"13:05"`.
pub fn to_24h(value: &str) -> String {
    match parse_12h(value) {
        Some((hour, minute)) => format!("{:02}:{:02}", hour, minute),
        None => value.to_string(),
    }
}

/// A clock-of-day value in both representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockTime {
    /// Canonical zero-padded `HH:MM`.
    pub hhmm: String,
    /// `H:MM AM|PM`.
    pub display: String,
    pub minutes: u32,
}

impl ClockTime {
    /// Accepts either representation; `None` when the value is not a valid time of day.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (hour, minute) = if is_12h(raw) {
            parse_12h(raw)?
        } else {
            parse_24h(raw)?
        };
        Some(Self {
            hhmm: format!("{:02}:{:02}", hour, minute),
            display: format_12h(hour, minute),
            minutes: hour * 60 + minute,
        })
    }
}

/// Minutes since midnight for a stored time in either representation.
pub fn minutes_of(value: &str) -> Option<u32> {
    ClockTime::parse(value).map(|clock| clock.minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_12h_handles_midnight_noon_and_afternoon() {
        assert_eq!(to_12h("00:00"), "12:00 AM");
        assert_eq!(to_12h("12:00"), "12:00 PM");
        assert_eq!(to_12h("13:05"), "1:05 PM");
        assert_eq!(to_12h("9:30"), "9:30 AM");
    }

    #[test]
    fn to_24h_handles_midnight_noon_and_afternoon() {
        assert_eq!(to_24h("12:00 AM"), "00:00");
        assert_eq!(to_24h("12:15 PM"), "12:15");
        assert_eq!(to_24h("1:05 PM"), "13:05");
        assert_eq!(to_24h("9:30 am"), "09:30");
    }

    #[test]
    fn codec_returns_input_unchanged_on_failure() {
        assert_eq!(to_12h("noon"), "noon");
        assert_eq!(to_12h("25:00"), "25:00");
        assert_eq!(to_24h("13:00 PM"), "13:00 PM");
        assert_eq!(to_24h("9:00"), "9:00");
    }

    #[test]
    fn every_canonical_time_round_trips() {
        for hour in 0..24 {
            for minute in [0, 1, 30, 59] {
                let canonical = format!("{:02}:{:02}", hour, minute);
                assert_eq!(to_24h(&to_12h(&canonical)), canonical);
            }
        }
    }

    #[test]
    fn clock_time_normalises_both_formats() {
        let from_24 = ClockTime::parse("9:00").unwrap();
        assert_eq!(from_24.hhmm, "09:00");
        assert_eq!(from_24.display, "9:00 AM");
        assert_eq!(from_24.minutes, 540);

        let from_12 = ClockTime::parse("2:45 PM").unwrap();
        assert_eq!(from_12.hhmm, "14:45");
        assert_eq!(from_12.minutes, 885);

        assert!(ClockTime::parse("abc").is_none());
        assert!(ClockTime::parse("10:75").is_none());
    }

    #[test]
    fn now_in_timezone_returns_datetime_in_tz() {
        let tz = chrono_tz::Asia::Kolkata;
        assert_eq!(now_in_timezone(&tz).timezone(), tz);
    }
}
