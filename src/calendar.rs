use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{ScheduleError, ScheduleResult, Violations};
use crate::item::WeekParity;

pub const DEFAULT_START_MONTH: u32 = 9;
pub const DEFAULT_START_DAY: u32 = 1;
/// Europe/Moscow, the reference zone of the timetables this engine was built for.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 180;
pub const DEFAULT_MAX_SEMESTERS: u32 = 12;

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Anything that names a calendar day. Time of day is dropped.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    /// The day in the value's own zone.
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicCalendarConfig {
    pub start_month: u32,
    pub start_day: u32,
    pub utc_offset_minutes: i32,
    pub non_teaching_day: Weekday,
    pub max_semesters: u32,
}

impl Default for AcademicCalendarConfig {
    fn default() -> Self {
        Self {
            start_month: DEFAULT_START_MONTH,
            start_day: DEFAULT_START_DAY,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            non_teaching_day: Weekday::Sun,
            max_semesters: DEFAULT_MAX_SEMESTERS,
        }
    }
}

impl AcademicCalendarConfig {
    pub fn validate(&self) -> ScheduleResult<()> {
        let mut violations = Violations::new();
        // Checked against a common year so the start exists every year.
        if NaiveDate::from_ymd_opt(2023, self.start_month, self.start_day).is_none() {
            violations.push(
                "start_day",
                format!(
                    "{:02}-{:02} is not a valid academic year start",
                    self.start_month, self.start_day
                ),
            );
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            violations.push(
                "utc_offset_minutes",
                format!("offset {} is outside +-18h", self.utc_offset_minutes),
            );
        }
        if self.max_semesters == 0 {
            violations.push("max_semesters", "at least one semester is required");
        }
        violations.into_result()
    }
}

impl From<&AcademicCalendar> for AcademicCalendarConfig {
    fn from(calendar: &AcademicCalendar) -> Self {
        Self {
            start_month: calendar.start_month,
            start_day: calendar.start_day,
            utc_offset_minutes: calendar.offset.local_minus_utc() / 60,
            non_teaching_day: calendar.non_teaching_day,
            max_semesters: calendar.max_semesters,
        }
    }
}

pub fn load_calendar_config<P: AsRef<Path>>(path: P) -> io::Result<AcademicCalendarConfig> {
    let file = File::open(path)?;
    let config = serde_json::from_reader(file)?;
    Ok(config)
}

pub fn save_calendar_config<P: AsRef<Path>>(
    config: &AcademicCalendarConfig,
    path: P,
) -> io::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

/// Week number and parity of a date relative to an education start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekInfo {
    /// 1-based.
    pub week_number: u32,
    /// `None` on the non-teaching day.
    pub parity: Option<WeekParity>,
}

impl WeekInfo {
    pub fn is_teaching_day(&self) -> bool {
        self.parity.is_some()
    }
}

/// Date arithmetic anchored to the start of an academic year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademicCalendar {
    start_month: u32,
    start_day: u32,
    offset: FixedOffset,
    non_teaching_day: Weekday,
    max_semesters: u32,
}

impl Default for AcademicCalendar {
    fn default() -> Self {
        Self {
            start_month: DEFAULT_START_MONTH,
            start_day: DEFAULT_START_DAY,
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
            non_teaching_day: Weekday::Sun,
            max_semesters: DEFAULT_MAX_SEMESTERS,
        }
    }
}

impl AcademicCalendar {
    pub fn from_config(config: &AcademicCalendarConfig) -> ScheduleResult<Self> {
        config.validate()?;
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            ScheduleError::invalid("utc_offset_minutes", "offset is out of range")
        })?;
        Ok(Self {
            start_month: config.start_month,
            start_day: config.start_day,
            offset,
            non_teaching_day: config.non_teaching_day,
            max_semesters: config.max_semesters,
        })
    }

    pub fn to_config(&self) -> AcademicCalendarConfig {
        AcademicCalendarConfig::from(self)
    }

    pub fn non_teaching_day(&self) -> Weekday {
        self.non_teaching_day
    }

    pub fn max_semesters(&self) -> u32 {
        self.max_semesters
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.offset
    }

    /// Longest study span in years implied by `max_semesters`.
    pub fn max_study_years(&self) -> u32 {
        self.max_semesters.div_ceil(2)
    }

    /// Calendar day of `instant` in the reference zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// First day of instruction for a group admitted in `admission_year`.
    ///
    /// Semesters are 1-based; an even semester shares the academic year of the odd one
    /// before it. Semester 0 is treated as the first semester.
    pub fn education_start(&self, admission_year: i32, semester: i32) -> ScheduleResult<NaiveDate> {
        let year_offset = (semester.max(1) - 1) / 2;
        let year = admission_year.checked_add(year_offset).ok_or_else(|| {
            ScheduleError::invalid("admission_year", format!("year {admission_year} is out of range"))
        })?;
        NaiveDate::from_ymd_opt(year, self.start_month, self.start_day).ok_or_else(|| {
            ScheduleError::invalid("admission_year", format!("year {year} is out of range"))
        })
    }

    /// Midnight of [`education_start`](Self::education_start) in the reference zone.
    pub fn education_start_instant(
        &self,
        admission_year: i32,
        semester: i32,
    ) -> ScheduleResult<DateTime<FixedOffset>> {
        let date = self.education_start(admission_year, semester)?;
        date.and_hms_opt(0, 0, 0)
            .and_then(|midnight| self.offset.from_local_datetime(&midnight).single())
            .ok_or_else(|| {
                ScheduleError::invalid("admission_year", format!("no local midnight on {date}"))
            })
    }

    pub fn is_teaching_day(&self, date: NaiveDate) -> bool {
        date.weekday() != self.non_teaching_day
    }

    pub fn week_info(&self, education_start: NaiveDate, date: NaiveDate) -> ScheduleResult<WeekInfo> {
        if date < education_start {
            return Err(ScheduleError::DateBeforeEducationStart {
                date,
                education_start,
            });
        }

        let days = (date - education_start).num_days();
        let week_number = u32::try_from(days / 7 + 1).map_err(|_| {
            ScheduleError::invalid("date", format!("{date} is too far from {education_start}"))
        })?;

        let parity = if self.is_teaching_day(date) {
            Some(WeekParity::for_week(week_number))
        } else {
            None
        };

        Ok(WeekInfo {
            week_number,
            parity,
        })
    }

    /// Teaching days from `start` to `end`, both inclusive.
    pub fn teaching_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;

        while current <= end {
            if self.is_teaching_day(current) {
                days.push(current);
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        days
    }

    pub fn count_teaching_days(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.teaching_days_in_range(start, end).len()
    }
}
