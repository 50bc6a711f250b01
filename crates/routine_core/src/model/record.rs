//! Persisted wire shapes for routine items.
//!
//! # Responsibility
//! - Define the JSON object layout written by the file repository.
//! - Accept older layouts on read (single `time` field, PascalCase desktop
//!   layout with hour/minute fields) without a migration step.
//!
//! # Invariants
//! - Writes always use `RoutineRecord`.
//! - Conversion into `RoutineItem` re-runs full validation.

use crate::model::routine::{RoutineId, RoutineItem, RoutineValidationError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Current persisted layout of one routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineRecord {
    pub id: RoutineId,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Older single-instant files name this field `time`.
    #[serde(alias = "time")]
    pub start_time: NaiveTime,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    pub activity: String,
}

/// Desktop-era layout: PascalCase fields, split hour/minute values and a
/// date-time `Date`. Derived display fields in those files are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyRoutineRecord {
    pub id: RoutineId,
    pub date: String,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    pub activity: String,
}

/// Any layout accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StoredRoutine {
    Current(RoutineRecord),
    Legacy(LegacyRoutineRecord),
}

impl From<RoutineItem> for RoutineRecord {
    fn from(item: RoutineItem) -> Self {
        Self {
            id: item.id(),
            date: item.date(),
            start_time: item.start_time(),
            end_time: item.end_time(),
            activity: item.activity().to_string(),
        }
    }
}

impl TryFrom<RoutineRecord> for RoutineItem {
    type Error = RoutineValidationError;

    fn try_from(record: RoutineRecord) -> Result<Self, Self::Error> {
        RoutineItem::with_id(
            record.id,
            record.date,
            record.start_time,
            record.end_time,
            &record.activity,
        )
    }
}

impl TryFrom<LegacyRoutineRecord> for RoutineItem {
    type Error = RoutineValidationError;

    fn try_from(record: LegacyRoutineRecord) -> Result<Self, Self::Error> {
        let date = parse_legacy_date(&record.date)?;
        let start_time = time_of_day(record.start_hour, record.start_minute)?;
        let end_time = time_of_day(record.end_hour, record.end_minute)?;
        RoutineItem::with_id(record.id, date, start_time, Some(end_time), &record.activity)
    }
}

impl TryFrom<StoredRoutine> for RoutineItem {
    type Error = RoutineValidationError;

    fn try_from(stored: StoredRoutine) -> Result<Self, Self::Error> {
        match stored {
            StoredRoutine::Current(record) => record.try_into(),
            StoredRoutine::Legacy(record) => record.try_into(),
        }
    }
}

/// Accepts `YYYY-MM-DD` optionally followed by a time/offset suffix.
fn parse_legacy_date(value: &str) -> Result<NaiveDate, RoutineValidationError> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| RoutineValidationError::InvalidDate(value.to_string()))
}

fn time_of_day(hour: u32, minute: u32) -> Result<NaiveTime, RoutineValidationError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or(RoutineValidationError::InvalidTime { hour, minute })
}
