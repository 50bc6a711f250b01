//! Routine item domain model.
//!
//! # Responsibility
//! - Define the canonical dated, timed activity record.
//! - Normalize activity text and validate the time window on construction.
//! - Derive ordering instants and display strings from stored fields.
//!
//! # Invariants
//! - `id` is non-nil, stable and never reused for another routine.
//! - `activity` is non-empty after normalization.
//! - When `end_time` is set, `ends_at()` is strictly after `starts_at()`.
//! - Times carry minute precision only.

use crate::model::record::{RoutineRecord, StoredRoutine};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a routine item.
pub type RoutineId = Uuid;

const DATE_DISPLAY_FORMAT: &str = "%d %b %Y";
const TIME_DISPLAY_FORMAT: &str = "%H:%M";
const RANGE_SEPARATOR: char = '\u{2013}';

/// Zero-width characters removed from activity text.
const ZERO_WIDTH_CHARS: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];
/// Non-breaking spaces folded into an ordinary space.
const NON_BREAKING_SPACES: [char; 2] = ['\u{00A0}', '\u{202F}'];

/// Validation failure for routine construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineValidationError {
    /// Activity text is empty after normalization.
    EmptyActivity,
    /// End instant is not strictly after the start instant.
    InvalidInterval {
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
    },
    /// Hour/minute pair outside `0..=23` / `0..=59`.
    InvalidTime { hour: u32, minute: u32 },
    /// Date text that could not be parsed.
    InvalidDate(String),
    /// Routine id is the nil UUID.
    NilId,
}

impl Display for RoutineValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyActivity => write!(f, "activity must not be empty"),
            Self::InvalidInterval { starts_at, ends_at } => write!(
                f,
                "end ({}) must be after start ({})",
                ends_at.format("%Y-%m-%d %H:%M"),
                starts_at.format("%Y-%m-%d %H:%M")
            ),
            Self::InvalidTime { hour, minute } => {
                write!(f, "invalid time of day {hour:02}:{minute:02}")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`"),
            Self::NilId => write!(f, "routine id must not be nil"),
        }
    }
}

impl Error for RoutineValidationError {}

/// One dated, timed activity record.
///
/// Fields are private so that a value can only exist after validation. The
/// store creates items through [`RoutineItem::with_id`]; deserialization runs
/// the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRoutine", into = "RoutineRecord")]
pub struct RoutineItem {
    id: RoutineId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    activity: String,
}

impl RoutineItem {
    /// Builds a validated routine with a caller-provided id.
    ///
    /// `activity` is normalized with [`normalize_activity`] before the
    /// emptiness check. Times are truncated to whole minutes. `end_time =
    /// None` records a single instant.
    ///
    /// # Errors
    /// - `NilId` when `id` is the nil UUID.
    /// - `EmptyActivity` when normalized activity is empty.
    /// - `InvalidInterval` when an end time is given and is not after start.
    pub fn with_id(
        id: RoutineId,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: Option<NaiveTime>,
        activity: &str,
    ) -> Result<Self, RoutineValidationError> {
        if id.is_nil() {
            return Err(RoutineValidationError::NilId);
        }

        let activity = normalize_activity(activity);
        if activity.is_empty() {
            return Err(RoutineValidationError::EmptyActivity);
        }

        let start_time = truncate_to_minute(start_time);
        let end_time = end_time.map(truncate_to_minute);
        if let Some(end_time) = end_time {
            let starts_at = date.and_time(start_time);
            let ends_at = date.and_time(end_time);
            if ends_at <= starts_at {
                return Err(RoutineValidationError::InvalidInterval { starts_at, ends_at });
            }
        }

        Ok(Self {
            id,
            date,
            start_time,
            end_time,
            activity,
        })
    }

    pub fn id(&self) -> RoutineId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        self.end_time
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    /// Returns whether this routine records a single instant.
    pub fn is_instant(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// End instant; equals `starts_at()` for single-instant routines.
    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time.unwrap_or(self.start_time))
    }

    /// Ordering key: `starts_at` ascending, ties broken by `ends_at`.
    pub fn schedule_key(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.starts_at(), self.ends_at())
    }

    /// Display date, e.g. `01 Jun 2024`.
    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_DISPLAY_FORMAT).to_string()
    }

    /// Display time range, e.g. `08:00–09:00`, or `08:00` for an instant.
    pub fn time_range(&self) -> String {
        let start = self.start_time.format(TIME_DISPLAY_FORMAT);
        match self.end_time {
            Some(end) => format!("{start}{RANGE_SEPARATOR}{}", end.format(TIME_DISPLAY_FORMAT)),
            None => start.to_string(),
        }
    }
}

/// Normalizes raw activity input.
///
/// Rules:
/// - zero-width characters are removed;
/// - non-breaking spaces become ordinary spaces;
/// - leading/trailing whitespace is trimmed.
pub fn normalize_activity(raw: &str) -> String {
    let cleaned = raw
        .chars()
        .filter(|ch| !ZERO_WIDTH_CHARS.contains(ch))
        .map(|ch| {
            if NON_BREAKING_SPACES.contains(&ch) {
                ' '
            } else {
                ch
            }
        })
        .collect::<String>();
    cleaned.trim().to_string()
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
