use chrono::{Datelike, NaiveDate};

use crate::calendar::AcademicCalendar;
use crate::error::{ScheduleError, ScheduleResult};
use crate::item::ScheduleItem;
use crate::schedule::{CalendarSchedule, CycledSchedule, Schedule};

/// Projects a weekly pattern onto concrete dates.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleProjector<'a> {
    calendar: &'a AcademicCalendar,
}

impl<'a> ScheduleProjector<'a> {
    pub fn new(calendar: &'a AcademicCalendar) -> Self {
        Self { calendar }
    }

    /// Lessons of `cycled` that take place on `date`, stamped with that date and its week number.
    ///
    /// The non-teaching day yields an empty list. A date before `education_start` is an error,
    /// and so is a calendar whose rest day differs from the one `cycled` was built with.
    pub fn items_on_date(
        &self,
        cycled: &CycledSchedule,
        education_start: NaiveDate,
        date: NaiveDate,
    ) -> ScheduleResult<Vec<ScheduleItem>> {
        self.check_rest_day(cycled)?;
        let info = self.calendar.week_info(education_start, date)?;
        let Some(parity) = info.parity else {
            return Ok(Vec::new());
        };

        Ok(cycled
            .list_items_by_weekday(date.weekday())
            .iter()
            .filter(|item| {
                item.week_parity()
                    .is_some_and(|item_parity| item_parity.applies_to(parity))
            })
            .map(|item| item.on_date(date, info.week_number))
            .collect())
    }

    /// Every lesson of `cycled` between its start and end dates, inclusive.
    ///
    /// Stops at the first failing day and reports it.
    pub fn materialize_items(
        &self,
        cycled: &CycledSchedule,
        education_start: NaiveDate,
    ) -> ScheduleResult<CalendarSchedule> {
        self.check_rest_day(cycled)?;
        let mut calendar = CalendarSchedule::new(cycled.non_teaching_day());

        for date in self
            .calendar
            .teaching_days_in_range(cycled.start_date(), cycled.end_date())
        {
            let wrap = |source: ScheduleError| ScheduleError::Projection {
                date,
                source: Box::new(source),
            };
            for item in self.items_on_date(cycled, education_start, date).map_err(wrap)? {
                calendar.push_dated(item).map_err(wrap)?;
            }
        }

        Ok(calendar)
    }

    /// Derives a calendar schedule for the same group and semester as `schedule`.
    pub fn materialize_calendar(
        &self,
        schedule: &Schedule,
        education_start: NaiveDate,
    ) -> ScheduleResult<Schedule> {
        let cycled = schedule.as_cycled()?;
        let calendar = self.materialize_items(cycled, education_start)?;
        Ok(Schedule::from_calendar(
            schedule.group_id(),
            schedule.semester(),
            calendar,
        ))
    }

    fn check_rest_day(&self, cycled: &CycledSchedule) -> ScheduleResult<()> {
        if self.calendar.non_teaching_day() == cycled.non_teaching_day() {
            return Ok(());
        }
        Err(ScheduleError::invalid(
            "non_teaching_day",
            format!(
                "calendar rests on {} but the schedule was built with {} as its rest day",
                self.calendar.non_teaching_day(),
                cycled.non_teaching_day()
            ),
        ))
    }
}
