//! Named broadcast time slots and local-time to UTC interval conversion.
//!
//! Slots are defined by their local start hour in the station timezone. A
//! slot runs until the next slot's start hour; the last slot of the day runs
//! until the first slot's hour on the following day. Stored intervals are
//! always UTC and half-open (`[start, end)`).

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// A named slot in the daily schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    /// Local hour (0-23) at which the slot starts.
    pub start_hour: u32,
    /// Stable identifier used by uploaders (e.g. `"morning"`).
    pub id: String,
    /// Human-readable label.
    pub label: String,
}

/// The station's daily slot table, ordered by start hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotTable {
    slots: Vec<TimeSlot>,
}

impl TimeSlotTable {
    /// Build a table from an arbitrary list of slots.
    ///
    /// Rejects empty tables, hours outside `0..24`, and duplicate ids or hours.
    pub fn new(mut slots: Vec<TimeSlot>) -> Result<Self, CoreError> {
        if slots.is_empty() {
            return Err(CoreError::Validation(
                "time slot table must not be empty".into(),
            ));
        }
        slots.sort_by_key(|s| s.start_hour);

        for (i, slot) in slots.iter().enumerate() {
            if slot.start_hour >= 24 {
                return Err(CoreError::Validation(format!(
                    "time slot '{}' starts at invalid hour {}",
                    slot.id, slot.start_hour
                )));
            }
            if slots[..i].iter().any(|s| s.id == slot.id) {
                return Err(CoreError::Validation(format!(
                    "duplicate time slot id '{}'",
                    slot.id
                )));
            }
            if i > 0 && slots[i - 1].start_hour == slot.start_hour {
                return Err(CoreError::Validation(format!(
                    "two time slots start at hour {}",
                    slot.start_hour
                )));
            }
        }

        Ok(Self { slots })
    }

    /// The station's standard weekday schedule.
    pub fn station_default() -> Self {
        let slot = |start_hour, id: &str, label: &str| TimeSlot {
            start_hour,
            id: id.to_string(),
            label: label.to_string(),
        };
        Self {
            slots: vec![
                slot(0, "early", "Overnight (00:00-06:00)"),
                slot(6, "morning", "Early Morning (06:00-09:00)"),
                slot(9, "noon", "Morning to Midday (09:00-14:00)"),
                slot(14, "afternoon", "Afternoon (14:00-17:00)"),
                slot(17, "jazz", "Rush Hour Jazz (17:00-19:00)"),
                slot(19, "night", "Evening (19:00-00:00)"),
            ],
        }
    }

    /// Parse a table from `hour=id=label` entries separated by `;`.
    ///
    /// ```text
    /// 0=early=Overnight;6=morning=Early Morning;19=night=Evening
    /// ```
    pub fn parse(spec: &str) -> Result<Self, CoreError> {
        let mut slots = Vec::new();
        for entry in spec.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, '=');
            let (Some(hour), Some(id), Some(label)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(CoreError::Validation(format!(
                    "time slot entry '{entry}' must look like hour=id=label"
                )));
            };
            let start_hour = hour.trim().parse::<u32>().map_err(|_| {
                CoreError::Validation(format!("time slot entry '{entry}' has a bad hour"))
            })?;
            slots.push(TimeSlot {
                start_hour,
                id: id.trim().to_string(),
                label: label.trim().to_string(),
            });
        }
        Self::new(slots)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Compute the UTC interval covered by `slot_id` on the local `date`.
    pub fn interval(
        &self,
        date: NaiveDate,
        slot_id: &str,
        tz: Tz,
    ) -> Result<(Timestamp, Timestamp), CoreError> {
        let pos = self
            .slots
            .iter()
            .position(|s| s.id == slot_id)
            .ok_or_else(|| CoreError::Validation(format!("unknown time slot '{slot_id}'")))?;

        let start_hour = self.slots[pos].start_hour;
        let (end_date, end_hour) = match self.slots.get(pos + 1) {
            Some(next) => (date, next.start_hour),
            None => (next_day(date)?, self.slots[0].start_hour),
        };

        let start = localize(date.and_time(hour_of_day(start_hour)?), tz)?;
        let end = localize(end_date.and_time(hour_of_day(end_hour)?), tz)?;
        Ok((start, end))
    }
}

/// Compute the UTC interval for explicit local start/end times on `date`.
///
/// An end time at or before the start time means the show runs past
/// midnight, so the end moves to the following day.
pub fn explicit_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    tz: Tz,
) -> Result<(Timestamp, Timestamp), CoreError> {
    let end_date = if end <= start { next_day(date)? } else { date };
    let start = localize(date.and_time(start), tz)?;
    let end = localize(end_date.and_time(end), tz)?;
    Ok((start, end))
}

/// Convert a local wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times
/// skipped by a DST jump are rejected.
fn localize(naive: NaiveDateTime, tz: Tz) -> Result<Timestamp, CoreError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            CoreError::Validation(format!("{naive} does not exist in timezone {tz}"))
        })
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, CoreError> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| CoreError::Validation(format!("date {date} is out of range")))
}

fn hour_of_day(hour: u32) -> Result<NaiveTime, CoreError> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| CoreError::Validation(format!("invalid hour {hour}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono_tz::America::New_York;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Named slots
    // -----------------------------------------------------------------------

    #[test]
    fn first_slot_runs_until_second() {
        let table = TimeSlotTable::station_default();
        let (start, end) = table.interval(date(2024, 1, 15), "early", New_York).unwrap();
        assert_eq!(start, utc("2024-01-15T05:00:00Z"));
        assert_eq!(end, utc("2024-01-15T11:00:00Z"));
    }

    #[test]
    fn last_slot_wraps_to_next_day() {
        let table = TimeSlotTable::station_default();
        let (start, end) = table.interval(date(2024, 7, 4), "night", New_York).unwrap();
        assert_eq!(start, utc("2024-07-04T23:00:00Z"));
        assert_eq!(end, utc("2024-07-05T04:00:00Z"));
    }

    #[test]
    fn slot_follows_daylight_saving_offset() {
        let table = TimeSlotTable::station_default();
        let (winter, _) = table.interval(date(2024, 1, 15), "jazz", New_York).unwrap();
        let (summer, _) = table.interval(date(2024, 7, 15), "jazz", New_York).unwrap();
        assert_eq!(winter, utc("2024-01-15T22:00:00Z"));
        assert_eq!(summer, utc("2024-07-15T21:00:00Z"));
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let table = TimeSlotTable::station_default();
        let err = table.interval(date(2024, 1, 15), "brunch", New_York).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("brunch"));
    }

    #[test]
    fn single_slot_table_spans_a_full_day() {
        let table = TimeSlotTable::parse("4=allday=All Day").unwrap();
        let (start, end) = table.interval(date(2024, 1, 15), "allday", chrono_tz::UTC).unwrap();
        assert_eq!(start, utc("2024-01-15T04:00:00Z"));
        assert_eq!(end, utc("2024-01-16T04:00:00Z"));
    }

    // -----------------------------------------------------------------------
    // Table construction
    // -----------------------------------------------------------------------

    #[test]
    fn parse_sorts_by_hour() {
        let table = TimeSlotTable::parse("12=b=Second; 0=a=First").unwrap();
        let ids: Vec<_> = table.slots().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn parse_rejects_malformed_entry() {
        assert!(TimeSlotTable::parse("0=early").is_err());
        assert!(TimeSlotTable::parse("x=early=Overnight").is_err());
        assert!(TimeSlotTable::parse("").is_err());
    }

    #[test]
    fn new_rejects_duplicates_and_bad_hours() {
        assert!(TimeSlotTable::parse("0=a=A;0=b=B").is_err());
        assert!(TimeSlotTable::parse("0=a=A;6=a=B").is_err());
        assert!(TimeSlotTable::parse("24=a=A").is_err());
    }

    // -----------------------------------------------------------------------
    // Explicit times
    // -----------------------------------------------------------------------

    #[test]
    fn explicit_interval_same_day() {
        let (start, end) =
            explicit_interval(date(2024, 1, 15), time(10, 0), time(12, 30), New_York).unwrap();
        assert_eq!(start, utc("2024-01-15T15:00:00Z"));
        assert_eq!(end, utc("2024-01-15T17:30:00Z"));
    }

    #[test]
    fn explicit_interval_wraps_past_midnight() {
        let (start, end) =
            explicit_interval(date(2024, 1, 15), time(22, 0), time(2, 0), New_York).unwrap();
        assert_eq!(start, utc("2024-01-16T03:00:00Z"));
        assert_eq!(end, utc("2024-01-16T07:00:00Z"));
    }

    #[test]
    fn explicit_interval_equal_times_spans_a_day() {
        let (start, end) =
            explicit_interval(date(2024, 1, 15), time(8, 0), time(8, 0), chrono_tz::UTC).unwrap();
        assert_eq!(end - start, chrono::Duration::hours(24));
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        // 02:30 is skipped on the spring-forward date.
        let err = explicit_interval(date(2024, 3, 10), time(2, 30), time(4, 0), New_York)
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn ambiguous_local_time_uses_earlier_instant() {
        // 01:30 happens twice on the fall-back date; the EDT reading comes first.
        let (start, _) =
            explicit_interval(date(2024, 11, 3), time(1, 30), time(3, 0), New_York).unwrap();
        assert_eq!(start, utc("2024-11-03T05:30:00Z"));
    }
}
