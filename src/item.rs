use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ScheduleError, Violations};

/// Which weeks of the academic calendar a recurring item applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum WeekParity {
    Odd = 0,
    Even = 1,
    Both = 2,
}

impl WeekParity {
    pub const ALL: [WeekParity; 3] = [WeekParity::Odd, WeekParity::Even, WeekParity::Both];

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(WeekParity::Odd),
            1 => Some(WeekParity::Even),
            2 => Some(WeekParity::Both),
            _ => None,
        }
    }

    pub fn code(self) -> i8 {
        self as i8
    }

    /// Parity of a 1-based academic week number.
    pub fn for_week(week_number: u32) -> Self {
        if week_number % 2 == 0 {
            WeekParity::Even
        } else {
            WeekParity::Odd
        }
    }

    /// True when an item tagged `self` takes place in a week of parity `week`.
    pub fn applies_to(self, week: WeekParity) -> bool {
        self == WeekParity::Both || self == week
    }

    /// True when two tags share at least one week.
    pub fn overlaps(self, other: WeekParity) -> bool {
        self == other || self == WeekParity::Both || other == WeekParity::Both
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekParity::Odd => "odd",
            WeekParity::Even => "even",
            WeekParity::Both => "both",
        }
    }

    /// Timetable column marker; weekly items carry no marker.
    pub fn short_label(self) -> &'static str {
        match self {
            WeekParity::Odd => "Н",
            WeekParity::Even => "Ч",
            WeekParity::Both => "",
        }
    }
}

impl fmt::Display for WeekParity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i8> for WeekParity {
    type Error = ScheduleError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::from_code(value)
            .ok_or_else(|| ScheduleError::invalid("week_parity", format!("unknown week type {value}")))
    }
}

impl FromStr for WeekParity {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "odd" => Ok(WeekParity::Odd),
            "even" => Ok(WeekParity::Even),
            "both" => Ok(WeekParity::Both),
            other => Err(ScheduleError::invalid(
                "week_parity",
                format!("unknown week type '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum LessonKind {
    Lecture = 0,
    Practice = 1,
    Seminar = 2,
    Exam = 3,
    Laboratory = 4,
}

impl LessonKind {
    pub const ALL: [LessonKind; 5] = [
        LessonKind::Lecture,
        LessonKind::Practice,
        LessonKind::Seminar,
        LessonKind::Exam,
        LessonKind::Laboratory,
    ];

    pub fn from_code(code: i8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LessonKind::Lecture => "lecture",
            LessonKind::Practice => "practice",
            LessonKind::Seminar => "seminar",
            LessonKind::Exam => "exam",
            LessonKind::Laboratory => "laboratory",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            LessonKind::Lecture => "лек.",
            LessonKind::Practice => "пр.",
            LessonKind::Seminar => "сем.",
            LessonKind::Exam => "экз.",
            LessonKind::Laboratory => "лаб.",
        }
    }
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i8> for LessonKind {
    type Error = ScheduleError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::from_code(value)
            .ok_or_else(|| ScheduleError::invalid("lesson_kind", format!("unknown lesson type {value}")))
    }
}

impl FromStr for LessonKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| {
                ScheduleError::invalid("lesson_kind", format!("unknown lesson type '{needle}'"))
            })
    }
}

/// Room a lesson takes place in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cabinet {
    pub building: String,
    pub auditorium: String,
}

impl Cabinet {
    pub fn new(building: impl Into<String>, auditorium: impl Into<String>) -> Self {
        Self {
            building: building.into(),
            auditorium: auditorium.into(),
        }
    }

    /// `building-auditorium`, the form printed in timetables.
    pub fn address(&self) -> String {
        format!("{}-{}", self.building, self.auditorium)
    }
}

/// When an item happens: every matching week, or on one concrete date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Occurrence {
    Recurring { week_parity: WeekParity },
    Dated { date: NaiveDate, week_number: u32 },
}

/// One lesson placement. Owned by the schedule variant that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub discipline: String,
    pub teacher_id: Uuid,
    pub weekday: Weekday,
    pub students_count: u16,
    /// Zero-based lesson period within the day.
    pub lesson_number: u8,
    /// 0 is the whole group.
    pub subgroup: u8,
    pub lesson_kind: LessonKind,
    pub cabinet: Cabinet,
    pub occurrence: Occurrence,
}

impl ScheduleItem {
    pub fn week_parity(&self) -> Option<WeekParity> {
        match self.occurrence {
            Occurrence::Recurring { week_parity } => Some(week_parity),
            Occurrence::Dated { .. } => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self.occurrence {
            Occurrence::Dated { date, .. } => Some(date),
            Occurrence::Recurring { .. } => None,
        }
    }

    pub fn week_number(&self) -> Option<u32> {
        match self.occurrence {
            Occurrence::Dated { week_number, .. } => Some(week_number),
            Occurrence::Recurring { .. } => None,
        }
    }

    pub fn is_whole_group(&self) -> bool {
        self.subgroup == 0
    }

    /// The whole group overlaps every subgroup; distinct subgroups never overlap.
    pub fn shares_students_with(&self, other: &ScheduleItem) -> bool {
        self.subgroup == other.subgroup || self.is_whole_group() || other.is_whole_group()
    }

    /// Copy of this item pinned to a concrete date.
    pub fn on_date(&self, date: NaiveDate, week_number: u32) -> ScheduleItem {
        ScheduleItem {
            occurrence: Occurrence::Dated { date, week_number },
            ..self.clone()
        }
    }
}

/// Unchecked lesson fields as they arrive from callers.
///
/// Signed integers mirror the transport representation so that negative or unknown
/// values can be reported instead of silently wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonInput {
    pub discipline: String,
    pub teacher_id: Uuid,
    pub students_count: i16,
    pub lesson_number: i8,
    pub subgroup: i8,
    pub lesson_kind: i8,
    pub cabinet: Cabinet,
}

impl LessonInput {
    pub fn new(discipline: impl Into<String>, teacher_id: Uuid, cabinet: Cabinet) -> Self {
        Self {
            discipline: discipline.into(),
            teacher_id,
            students_count: 0,
            lesson_number: 0,
            subgroup: 0,
            lesson_kind: LessonKind::Lecture.code(),
            cabinet,
        }
    }
}

impl TryFrom<&ScheduleItem> for LessonInput {
    type Error = ScheduleError;

    /// Fails when a stored value does not fit the caller-facing range.
    fn try_from(item: &ScheduleItem) -> Result<Self, Self::Error> {
        let mut violations = Violations::new();
        let students_count = i16::try_from(item.students_count).unwrap_or_else(|_| {
            violations.push(
                "students_count",
                format!("students count {} is out of range", item.students_count),
            );
            0
        });
        let lesson_number = i8::try_from(item.lesson_number).unwrap_or_else(|_| {
            violations.push(
                "lesson_number",
                format!("lesson number {} is out of range", item.lesson_number),
            );
            0
        });
        let subgroup = i8::try_from(item.subgroup).unwrap_or_else(|_| {
            violations.push("subgroup", format!("subgroup {} is out of range", item.subgroup));
            0
        });
        violations.into_result()?;

        Ok(Self {
            discipline: item.discipline.clone(),
            teacher_id: item.teacher_id,
            students_count,
            lesson_number,
            subgroup,
            lesson_kind: item.lesson_kind.code(),
            cabinet: item.cabinet.clone(),
        })
    }
}
