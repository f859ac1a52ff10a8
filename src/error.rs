use chrono::{NaiveDate, Weekday};
use std::fmt;
use thiserror::Error;

use crate::item::WeekParity;
use crate::schedule::ScheduleKind;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Coarse error classes callers translate into their own responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidData,
    ItemConflict,
    ItemNotFound,
    Projection,
}

/// A single rejected argument: which field and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every violation found while checking one request, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.0.push(Violation {
            field,
            reason: reason.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|v| v.field).collect()
    }

    /// `Ok(())` when nothing was recorded, otherwise an invalid-data error carrying all of them.
    pub fn into_result(self) -> ScheduleResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ScheduleError::InvalidData(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl From<Violation> for Violations {
    fn from(value: Violation) -> Self {
        Self(vec![value])
    }
}

/// Where an existing item already occupies the requested slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictScope {
    Weekday {
        weekday: Weekday,
        subgroup: u8,
        week_parity: WeekParity,
    },
    Date {
        date: NaiveDate,
        subgroup: u8,
    },
}

impl fmt::Display for ConflictScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictScope::Weekday {
                weekday,
                subgroup,
                week_parity,
            } => write!(
                f,
                "on {weekday} for subgroup {subgroup} in {} weeks",
                week_parity.as_str()
            ),
            ConflictScope::Date { date, subgroup } => {
                write!(f, "on {date} for subgroup {subgroup}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid data: {0}")]
    InvalidData(Violations),

    #[error("item conflict: lesson {lesson_number} is already taken {scope}")]
    ItemConflict {
        lesson_number: u8,
        scope: ConflictScope,
    },

    #[error("item not found")]
    ItemNotFound,

    #[error("date {date} precedes education start {education_start}")]
    DateBeforeEducationStart {
        date: NaiveDate,
        education_start: NaiveDate,
    },

    #[error("get items for date {date}: {source}")]
    Projection {
        date: NaiveDate,
        #[source]
        source: Box<ScheduleError>,
    },

    #[error("operation requires a {expected} schedule, got {actual}")]
    KindMismatch {
        expected: ScheduleKind,
        actual: ScheduleKind,
    },
}

impl ScheduleError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        let mut violations = Violations::new();
        violations.push(field, reason);
        Self::InvalidData(violations)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::InvalidData(_) | ScheduleError::KindMismatch { .. } => {
                ErrorKind::InvalidData
            }
            ScheduleError::ItemConflict { .. } => ErrorKind::ItemConflict,
            ScheduleError::ItemNotFound => ErrorKind::ItemNotFound,
            ScheduleError::DateBeforeEducationStart { .. } | ScheduleError::Projection { .. } => {
                ErrorKind::Projection
            }
        }
    }

    pub fn violations(&self) -> Option<&Violations> {
        match self {
            ScheduleError::InvalidData(violations) => Some(violations),
            _ => None,
        }
    }
}
