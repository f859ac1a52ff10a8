pub mod calendar;
pub mod cycled;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::calendar::AcademicCalendar;
use crate::error::{ScheduleError, ScheduleResult, Violations};
use crate::item::ScheduleItem;

pub use calendar::{CalendarItemKey, CalendarSchedule};
pub use cycled::{CycledItemKey, CycledSchedule, items_conflict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Cycled,
    Calendar,
}

impl ScheduleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleKind::Cycled => "cycled",
            ScheduleKind::Calendar => "calendar",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleVariant {
    Cycled(CycledSchedule),
    Calendar(CalendarSchedule),
}

impl ScheduleVariant {
    pub fn kind(&self) -> ScheduleKind {
        match self {
            ScheduleVariant::Cycled(_) => ScheduleKind::Cycled,
            ScheduleVariant::Calendar(_) => ScheduleKind::Calendar,
        }
    }
}

/// Field edits applied by update flows; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleUpdate {
    pub semester: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A group's timetable for one semester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    id: Uuid,
    group_id: Uuid,
    semester: u32,
    variant: ScheduleVariant,
}

impl Schedule {
    pub fn new_cycled(
        calendar: &AcademicCalendar,
        group_id: Uuid,
        semester: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        admission_year: i32,
        current_year: i32,
    ) -> ScheduleResult<Self> {
        let mut violations = Violations::new();
        check_bounds(calendar, semester, admission_year, current_year, &mut violations);
        check_date_range(start_date, end_date, &mut violations);
        violations.into_result()?;

        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            semester: semester.unsigned_abs(),
            variant: ScheduleVariant::Cycled(CycledSchedule::new(
                start_date,
                end_date,
                calendar.non_teaching_day(),
            )),
        })
    }

    /// Wraps a materialized calendar under a fresh id.
    pub(crate) fn from_calendar(group_id: Uuid, semester: u32, calendar: CalendarSchedule) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            semester,
            variant: ScheduleVariant::Calendar(calendar),
        }
    }

    pub(crate) fn from_parts(id: Uuid, group_id: Uuid, semester: u32, variant: ScheduleVariant) -> Self {
        Self {
            id,
            group_id,
            semester,
            variant,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    pub fn semester(&self) -> u32 {
        self.semester
    }

    pub fn kind(&self) -> ScheduleKind {
        self.variant.kind()
    }

    pub fn variant(&self) -> &ScheduleVariant {
        &self.variant
    }

    pub fn as_cycled(&self) -> ScheduleResult<&CycledSchedule> {
        match &self.variant {
            ScheduleVariant::Cycled(cycled) => Ok(cycled),
            ScheduleVariant::Calendar(_) => Err(self.mismatch(ScheduleKind::Cycled)),
        }
    }

    pub fn as_cycled_mut(&mut self) -> ScheduleResult<&mut CycledSchedule> {
        let err = self.mismatch(ScheduleKind::Cycled);
        match &mut self.variant {
            ScheduleVariant::Cycled(cycled) => Ok(cycled),
            ScheduleVariant::Calendar(_) => Err(err),
        }
    }

    pub fn as_calendar(&self) -> ScheduleResult<&CalendarSchedule> {
        match &self.variant {
            ScheduleVariant::Calendar(calendar) => Ok(calendar),
            ScheduleVariant::Cycled(_) => Err(self.mismatch(ScheduleKind::Calendar)),
        }
    }

    pub fn as_calendar_mut(&mut self) -> ScheduleResult<&mut CalendarSchedule> {
        let err = self.mismatch(ScheduleKind::Calendar);
        match &mut self.variant {
            ScheduleVariant::Calendar(calendar) => Ok(calendar),
            ScheduleVariant::Cycled(_) => Err(err),
        }
    }

    pub fn list_items(&self) -> Vec<&ScheduleItem> {
        match &self.variant {
            ScheduleVariant::Cycled(cycled) => cycled.list_items(),
            ScheduleVariant::Calendar(calendar) => calendar.list_items(),
        }
    }

    pub fn item_count(&self) -> usize {
        match &self.variant {
            ScheduleVariant::Cycled(cycled) => cycled.len(),
            ScheduleVariant::Calendar(calendar) => calendar.len(),
        }
    }

    pub fn clear_items(&mut self) {
        match &mut self.variant {
            ScheduleVariant::Cycled(cycled) => cycled.clear(),
            ScheduleVariant::Calendar(calendar) => calendar.clear(),
        }
    }

    /// Raw edit; run [`validate`](Self::validate) before persisting.
    pub fn set_semester(&mut self, semester: u32) {
        self.semester = semester;
    }

    /// Re-runs the construction checks against the current fields and items.
    pub fn validate(
        &self,
        calendar: &AcademicCalendar,
        admission_year: i32,
        current_year: i32,
    ) -> ScheduleResult<()> {
        let mut violations = Violations::new();
        let semester = i32::try_from(self.semester).unwrap_or(i32::MAX);
        check_bounds(calendar, semester, admission_year, current_year, &mut violations);

        match &self.variant {
            ScheduleVariant::Cycled(cycled) => {
                check_date_range(cycled.start_date(), cycled.end_date(), &mut violations);
                cycled.check_items(&mut violations);
            }
            ScheduleVariant::Calendar(calendar) => calendar.check_items(&mut violations),
        }

        violations.into_result()
    }

    /// Applies `update` only if the edited schedule still validates.
    pub fn apply_update(
        &mut self,
        update: ScheduleUpdate,
        calendar: &AcademicCalendar,
        admission_year: i32,
        current_year: i32,
    ) -> ScheduleResult<()> {
        let mut edited = self.clone();

        if let Some(semester) = update.semester {
            let semester = u32::try_from(semester).map_err(|_| {
                ScheduleError::invalid("semester", format!("invalid semester value {semester}"))
            })?;
            edited.semester = semester;
        }

        if update.start_date.is_some() || update.end_date.is_some() {
            let cycled = edited.as_cycled_mut()?;
            let start = update.start_date.unwrap_or(cycled.start_date());
            let end = update.end_date.unwrap_or(cycled.end_date());
            cycled.set_date_range(start, end)?;
        }

        edited.validate(calendar, admission_year, current_year)?;
        *self = edited;
        Ok(())
    }

    fn mismatch(&self, expected: ScheduleKind) -> ScheduleError {
        ScheduleError::KindMismatch {
            expected,
            actual: self.kind(),
        }
    }
}

fn check_bounds(
    calendar: &AcademicCalendar,
    semester: i32,
    admission_year: i32,
    current_year: i32,
    violations: &mut Violations,
) {
    let max_semesters = i64::from(calendar.max_semesters());
    let semester = i64::from(semester);
    let admission = i64::from(admission_year);
    let current = i64::from(current_year);

    if semester < 0 {
        violations.push("semester", format!("invalid semester value {semester}"));
    } else if semester > max_semesters {
        violations.push(
            "semester",
            format!("semester {semester} exceeds the {max_semesters}-semester program"),
        );
    }

    if admission > current {
        violations.push(
            "admission_year",
            format!("admission year {admission} is in the future (current year {current})"),
        );
        return;
    }

    let years_studied = current - admission;
    if years_studied > i64::from(calendar.max_study_years()) {
        violations.push(
            "admission_year",
            format!("a group admitted in {admission} has finished its program by {current}"),
        );
    }

    // A group can at most be starting its next academic year during `current`.
    let reachable = (years_studied + 1) * 2;
    if semester > reachable && semester <= max_semesters {
        violations.push(
            "semester",
            format!("semester {semester} is not reached by {current} for a group admitted in {admission}"),
        );
    }
}

fn check_date_range(start: NaiveDate, end: NaiveDate, violations: &mut Violations) {
    if start > end {
        violations.push(
            "start_date",
            format!("start date {start} is after end date {end}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::item::{Cabinet, LessonInput};
    use chrono::Weekday;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spring(admission_year: i32) -> ScheduleResult<Schedule> {
        Schedule::new_cycled(
            &AcademicCalendar::default(),
            Uuid::new_v4(),
            2,
            d(2026, 2, 2),
            d(2026, 2, 8),
            admission_year,
            2026,
        )
    }

    #[test]
    fn second_semester_for_last_years_group() {
        let schedule = spring(2025).unwrap();
        assert_eq!(schedule.kind(), ScheduleKind::Cycled);
        assert_eq!(schedule.semester(), 2);
        assert_eq!(schedule.as_cycled().unwrap().start_date(), d(2026, 2, 2));
        assert_eq!(schedule.item_count(), 0);
    }

    #[test]
    fn future_admission_is_rejected() {
        let err = spring(2027).unwrap_err();
        assert!(err.violations().unwrap().mentions("admission_year"));
    }

    #[test]
    fn construction_reports_all_violations() {
        let err = Schedule::new_cycled(
            &AcademicCalendar::default(),
            Uuid::new_v4(),
            -1,
            d(2026, 2, 8),
            d(2026, 2, 2),
            2025,
            2026,
        )
        .unwrap_err();
        let violations = err.violations().unwrap();
        assert!(violations.mentions("semester"));
        assert!(violations.mentions("start_date"));
    }

    #[test]
    fn semester_bounds_follow_program_length() {
        let cal = AcademicCalendar::default();
        let make = |semester, admission| {
            Schedule::new_cycled(
                &cal,
                Uuid::nil(),
                semester,
                d(2026, 2, 2),
                d(2026, 6, 30),
                admission,
                2026,
            )
        };
        assert!(make(13, 2019).is_err());
        assert!(make(12, 2020).is_ok());
        // Admitted in 2026: semesters 1 and 2 only.
        assert!(make(2, 2026).is_ok());
        assert!(make(3, 2026).is_err());
        assert!(make(1, 2019).is_err());
    }

    #[test]
    fn accessors_enforce_variant() {
        let mut schedule = spring(2025).unwrap();
        assert!(schedule.as_cycled_mut().is_ok());
        let err = schedule.as_calendar().unwrap_err();
        assert_eq!(
            err,
            ScheduleError::KindMismatch {
                expected: ScheduleKind::Calendar,
                actual: ScheduleKind::Cycled,
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn apply_update_is_all_or_nothing() {
        let cal = AcademicCalendar::default();
        let mut schedule = spring(2025).unwrap();

        let bad = ScheduleUpdate {
            semester: Some(9),
            end_date: Some(d(2026, 1, 1)),
            ..ScheduleUpdate::default()
        };
        let err = schedule.apply_update(bad, &cal, 2025, 2026).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(schedule.semester(), 2);
        assert_eq!(schedule.as_cycled().unwrap().end_date(), d(2026, 2, 8));

        let good = ScheduleUpdate {
            semester: Some(1),
            end_date: Some(d(2026, 6, 30)),
            ..ScheduleUpdate::default()
        };
        schedule.apply_update(good, &cal, 2025, 2026).unwrap();
        assert_eq!(schedule.semester(), 1);
        assert_eq!(schedule.as_cycled().unwrap().end_date(), d(2026, 6, 30));
    }

    #[test]
    fn validate_catches_raw_semester_edit() {
        let cal = AcademicCalendar::default();
        let mut schedule = spring(2025).unwrap();
        schedule.set_semester(40);
        assert!(schedule.validate(&cal, 2025, 2026).is_err());
        schedule.set_semester(3);
        assert!(schedule.validate(&cal, 2025, 2026).is_ok());
    }

    #[test]
    fn list_items_dispatches_to_cycled() {
        let mut schedule = spring(2025).unwrap();
        let cycled = schedule.as_cycled_mut().unwrap();
        cycled
            .add_item(
                Weekday::Fri,
                2,
                LessonInput::new("Chemistry", Uuid::nil(), Cabinet::new("5", "7")),
            )
            .unwrap();
        assert_eq!(schedule.list_items().len(), 1);
        schedule.clear_items();
        assert_eq!(schedule.item_count(), 0);
    }
}
