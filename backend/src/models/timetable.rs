//! Weekly class timetable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Teaching days. Sunday has no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Option<Self> {
        match day {
            chrono::Weekday::Mon => Some(Weekday::Monday),
            chrono::Weekday::Tue => Some(Weekday::Tuesday),
            chrono::Weekday::Wed => Some(Weekday::Wednesday),
            chrono::Weekday::Thu => Some(Weekday::Thursday),
            chrono::Weekday::Fri => Some(Weekday::Friday),
            chrono::Weekday::Sat => Some(Weekday::Saturday),
            chrono::Weekday::Sun => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| wanted.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: String,
    pub day: Weekday,
    /// Upper-cased cohort identifier; clashes are only checked within a section.
    pub section: String,
    /// `HH:MM`
    pub start_time: String,
    pub start_time_12: String,
    /// `HH:MM`
    pub end_time: String,
    pub end_time_12: String,
    pub class_name: String,
    pub faculty_name: String,
    pub subject: String,
    #[serde(default)]
    pub topic_covered: String,
    #[serde(default)]
    pub classroom: String,
    #[serde(default)]
    pub building: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TimetableEntry {
    pub fn time_range_display(&self) -> String {
        format!("{} - {}", self.start_time_12, self.end_time_12)
    }
}

/// Day buckets in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable(pub BTreeMap<Weekday, Vec<TimetableEntry>>);

impl Timetable {
    /// Six empty buckets.
    pub fn empty() -> Self {
        let mut timetable = Self::default();
        timetable.ensure_all_days();
        timetable
    }

    pub fn ensure_all_days(&mut self) {
        for day in Weekday::ALL {
            self.0.entry(day).or_default();
        }
    }

    pub fn day(&self, day: Weekday) -> &[TimetableEntry] {
        self.0.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut Vec<TimetableEntry> {
        self.0.entry(day).or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TimetableEntry> {
        self.0.values().flatten()
    }

    pub fn find(&self, id: &str) -> Option<&TimetableEntry> {
        self.entries().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fields accepted by add and update. On update, absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimetableEntryInput {
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub class_name: Option<String>,
    pub faculty_name: Option<String>,
    pub subject: Option<String>,
    pub section: Option<String>,
    pub topic_covered: Option<String>,
    pub classroom: Option<String>,
    pub building: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parsing_is_case_insensitive_and_excludes_sunday() {
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!(" FRIDAY ".parse::<Weekday>().unwrap(), Weekday::Friday);
        assert!("Sunday".parse::<Weekday>().is_err());
        assert!(Weekday::from_chrono(chrono::Weekday::Sun).is_none());
    }

    #[test]
    fn empty_timetable_serialises_all_six_days() {
        let json = serde_json::to_value(Timetable::empty()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 6);
        for day in Weekday::ALL {
            assert_eq!(json[day.as_str()], serde_json::json!([]));
        }
    }
}
