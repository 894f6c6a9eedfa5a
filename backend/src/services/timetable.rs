//! Timetable engine: entry validation, clash detection, expiry and day transfer.
//!
//! Every function here works on an already-loaded [`Timetable`]; callers hold the collection
//! lock around load, mutation and save so the clash check cannot race another write.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::{
    models::timetable::{Timetable, TimetableEntry, TimetableEntryInput, Weekday},
    utils::time::{minute_of_day, minutes_of, ClockTime},
    validation::{non_empty, sanitize_input},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimetableError {
    #[error("All required fields including section must be provided")]
    MissingFields,
    #[error("Invalid time format")]
    InvalidTime(String),
    #[error("End time must be after start time")]
    InvalidInterval,
    #[error("Invalid day")]
    InvalidDay(String),
    #[error("Time clash detected! {conflicting_class} is scheduled from {conflicting_time}")]
    ScheduleClash {
        conflicting_class: String,
        conflicting_time: String,
    },
    #[error("Timetable entry not found")]
    NotFound(String),
}

/// The first existing entry overlapping a candidate slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clash {
    pub conflicting_class: String,
    pub conflicting_time: String,
}

impl From<Clash> for TimetableError {
    fn from(clash: Clash) -> Self {
        TimetableError::ScheduleClash {
            conflicting_class: clash.conflicting_class,
            conflicting_time: clash.conflicting_time,
        }
    }
}

/// Validated field set for a new or updated entry.
#[derive(Debug, Clone)]
struct Draft {
    day: Weekday,
    section: String,
    start: ClockTime,
    end: ClockTime,
    class_name: String,
    faculty_name: String,
    subject: String,
    topic_covered: String,
    classroom: String,
    building: String,
}

/// Raw values after merging input over any stored entry.
struct RawFields {
    day: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    class_name: Option<String>,
    faculty_name: Option<String>,
    subject: Option<String>,
    section: Option<String>,
    topic_covered: String,
    classroom: String,
    building: String,
}

fn clean(value: Option<&str>) -> Option<String> {
    non_empty(value).map(sanitize_input)
}

impl RawFields {
    fn from_input(input: &TimetableEntryInput) -> Self {
        Self {
            day: non_empty(input.day.as_deref()).map(str::to_string),
            start_time: non_empty(input.start_time.as_deref()).map(str::to_string),
            end_time: non_empty(input.end_time.as_deref()).map(str::to_string),
            class_name: clean(input.class_name.as_deref()),
            faculty_name: clean(input.faculty_name.as_deref()),
            subject: clean(input.subject.as_deref()),
            section: non_empty(input.section.as_deref()).map(str::to_uppercase),
            topic_covered: clean(input.topic_covered.as_deref()).unwrap_or_default(),
            classroom: clean(input.classroom.as_deref()).unwrap_or_default(),
            building: clean(input.building.as_deref()).unwrap_or_default(),
        }
    }

    /// Provided fields win; stored values are already sanitised and are kept as they are.
    fn merged(input: &TimetableEntryInput, stored: &TimetableEntry) -> Self {
        let optional = |provided: &Option<String>, current: &str| match provided {
            Some(value) => sanitize_input(value),
            None => current.to_string(),
        };
        let required = |provided: &Option<String>, current: &str, sanitize: bool| match provided {
            Some(value) if sanitize => clean(Some(value.as_str())),
            Some(value) => non_empty(Some(value.as_str())).map(str::to_string),
            None => non_empty(Some(current)).map(str::to_string),
        };
        Self {
            day: required(&input.day, stored.day.as_str(), false),
            start_time: required(&input.start_time, &stored.start_time, false),
            end_time: required(&input.end_time, &stored.end_time, false),
            class_name: required(&input.class_name, &stored.class_name, true),
            faculty_name: required(&input.faculty_name, &stored.faculty_name, true),
            subject: required(&input.subject, &stored.subject, true),
            section: required(&input.section, &stored.section, false).map(|s| s.to_uppercase()),
            topic_covered: optional(&input.topic_covered, &stored.topic_covered),
            classroom: optional(&input.classroom, &stored.classroom),
            building: optional(&input.building, &stored.building),
        }
    }

    /// Required fields, then time normalisation, then interval, then day.
    fn validate(self) -> Result<Draft, TimetableError> {
        let (
            Some(day),
            Some(start_time),
            Some(end_time),
            Some(class_name),
            Some(faculty_name),
            Some(subject),
            Some(section),
        ) = (
            self.day,
            self.start_time,
            self.end_time,
            self.class_name,
            self.faculty_name,
            self.subject,
            self.section,
        )
        else {
            return Err(TimetableError::MissingFields);
        };

        let start =
            ClockTime::parse(&start_time).ok_or(TimetableError::InvalidTime(start_time))?;
        let end = ClockTime::parse(&end_time).ok_or(TimetableError::InvalidTime(end_time))?;
        if end.minutes <= start.minutes {
            return Err(TimetableError::InvalidInterval);
        }
        let day: Weekday = day.parse().map_err(TimetableError::InvalidDay)?;

        Ok(Draft {
            day,
            section,
            start,
            end,
            class_name,
            faculty_name,
            subject,
            topic_covered: self.topic_covered,
            classroom: self.classroom,
            building: self.building,
        })
    }
}

/// Scans `day` in stored order and returns the first same-section entry whose half-open
/// interval overlaps `[start, end)`. Entries with unreadable times are skipped.
pub fn find_clash(
    timetable: &Timetable,
    day: Weekday,
    section: &str,
    start: u32,
    end: u32,
    exclude_id: Option<&str>,
) -> Option<Clash> {
    timetable
        .day(day)
        .iter()
        .filter(|entry| Some(entry.id.as_str()) != exclude_id)
        .filter(|entry| entry.section.eq_ignore_ascii_case(section))
        .find(|entry| {
            match (minutes_of(&entry.start_time), minutes_of(&entry.end_time)) {
                (Some(existing_start), Some(existing_end)) => {
                    start < existing_end && end > existing_start
                }
                _ => false,
            }
        })
        .map(|entry| Clash {
            conflicting_class: entry.class_name.clone(),
            conflicting_time: entry.time_range_display(),
        })
}

/// Validates, clash-checks and appends a new entry to its day bucket.
pub fn add_entry(
    timetable: &mut Timetable,
    input: &TimetableEntryInput,
    id: String,
    created_by: &str,
    now: DateTime<Utc>,
) -> Result<TimetableEntry, TimetableError> {
    let draft = RawFields::from_input(input).validate()?;
    if let Some(clash) = find_clash(
        timetable,
        draft.day,
        &draft.section,
        draft.start.minutes,
        draft.end.minutes,
        None,
    ) {
        return Err(clash.into());
    }

    let entry = TimetableEntry {
        id,
        day: draft.day,
        section: draft.section,
        start_time: draft.start.hhmm,
        start_time_12: draft.start.display,
        end_time: draft.end.hhmm,
        end_time_12: draft.end.display,
        class_name: draft.class_name,
        faculty_name: draft.faculty_name,
        subject: draft.subject,
        topic_covered: draft.topic_covered,
        classroom: draft.classroom,
        building: draft.building,
        created_at: now,
        created_by: created_by.to_string(),
        updated_at: None,
    };
    timetable.day_mut(entry.day).push(entry.clone());
    Ok(entry)
}

fn locate(timetable: &Timetable, id: &str) -> Option<(Weekday, usize)> {
    timetable.0.iter().find_map(|(day, entries)| {
        entries
            .iter()
            .position(|entry| entry.id == id)
            .map(|index| (*day, index))
    })
}

/// Merges `input` over the stored entry and re-validates it against every other entry.
/// An entry whose day changes is moved to the end of the new day's bucket.
pub fn update_entry(
    timetable: &mut Timetable,
    id: &str,
    input: &TimetableEntryInput,
    now: DateTime<Utc>,
) -> Result<TimetableEntry, TimetableError> {
    let (current_day, index) =
        locate(timetable, id).ok_or_else(|| TimetableError::NotFound(id.to_string()))?;
    let stored = &timetable.day(current_day)[index];

    let draft = RawFields::merged(input, stored).validate()?;
    if let Some(clash) = find_clash(
        timetable,
        draft.day,
        &draft.section,
        draft.start.minutes,
        draft.end.minutes,
        Some(id),
    ) {
        return Err(clash.into());
    }

    let bucket = timetable.day_mut(current_day);
    let mut entry = bucket.remove(index);
    entry.day = draft.day;
    entry.section = draft.section;
    entry.start_time = draft.start.hhmm;
    entry.start_time_12 = draft.start.display;
    entry.end_time = draft.end.hhmm;
    entry.end_time_12 = draft.end.display;
    entry.class_name = draft.class_name;
    entry.faculty_name = draft.faculty_name;
    entry.subject = draft.subject;
    entry.topic_covered = draft.topic_covered;
    entry.classroom = draft.classroom;
    entry.building = draft.building;
    entry.updated_at = Some(now);

    if entry.day == current_day {
        bucket.insert(index, entry.clone());
    } else {
        timetable.day_mut(entry.day).push(entry.clone());
    }
    Ok(entry)
}

/// Removes the first entry with `id`.
pub fn delete_entry(timetable: &mut Timetable, id: &str) -> Result<TimetableEntry, TimetableError> {
    let (day, index) =
        locate(timetable, id).ok_or_else(|| TimetableError::NotFound(id.to_string()))?;
    Ok(timetable.day_mut(day).remove(index))
}

/// An entry is expired once its end time has passed on its own weekday. Other days never
/// expire: the timetable is a repeating weekly template.
pub fn is_expired(entry: &TimetableEntry, now: &DateTime<Tz>) -> bool {
    if Weekday::from_chrono(now.weekday()) != Some(entry.day) {
        return false;
    }
    match minutes_of(&entry.end_time) {
        Some(end) => end < minute_of_day(now),
        None => false,
    }
}

/// Drops expired entries from every bucket and returns how many were removed.
pub fn purge_expired(timetable: &mut Timetable, now: &DateTime<Tz>) -> usize {
    let mut removed = 0;
    for entries in timetable.0.values_mut() {
        let before = entries.len();
        entries.retain(|entry| !is_expired(entry, now));
        removed += before - entries.len();
    }
    removed
}

/// Today's entries that have not ended yet.
pub fn todays_active<'a>(timetable: &'a Timetable, now: &DateTime<Tz>) -> Vec<&'a TimetableEntry> {
    match Weekday::from_chrono(now.weekday()) {
        Some(today) => timetable
            .day(today)
            .iter()
            .filter(|entry| !is_expired(entry, now))
            .collect(),
        None => Vec::new(),
    }
}

/// Removes every entry belonging to one of `sections` (case-insensitive).
pub fn clear_sections(timetable: &mut Timetable, sections: &[String]) -> usize {
    let mut removed = 0;
    for entries in timetable.0.values_mut() {
        let before = entries.len();
        entries.retain(|entry| {
            !sections
                .iter()
                .any(|section| section.eq_ignore_ascii_case(&entry.section))
        });
        removed += before - entries.len();
    }
    removed
}
