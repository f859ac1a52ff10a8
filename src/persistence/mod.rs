use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::item::{LessonInput, Occurrence, ScheduleItem};
use crate::schedule::{CalendarSchedule, CycledSchedule, Schedule, ScheduleKind, ScheduleVariant};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored schedule rejected: {0}")]
    Domain(#[from] ScheduleError),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("schedule store lock poisoned")]
    LockPoisoned,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Replace-all storage for schedules. A save overwrites every item of the stored copy.
pub trait ScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()>;
    fn load_schedule(&self, id: Uuid) -> PersistenceResult<Option<Schedule>>;
    fn list_schedules(&self) -> PersistenceResult<Vec<Schedule>>;
    /// Returns whether anything was deleted.
    fn delete_schedule(&self, id: Uuid) -> PersistenceResult<bool>;

    fn list_schedules_by_group(&self, group_id: Uuid) -> PersistenceResult<Vec<Schedule>> {
        let mut schedules = self.list_schedules()?;
        schedules.retain(|schedule| schedule.group_id() == group_id);
        Ok(schedules)
    }
}

/// Flat, variant-tagged form of a [`Schedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub id: Uuid,
    pub group_id: Uuid,
    pub semester: u32,
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub non_teaching_day: Weekday,
    pub items: Vec<ScheduleItem>,
}

impl ScheduleSnapshot {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let (start_date, end_date, non_teaching_day) = match schedule.variant() {
            ScheduleVariant::Cycled(cycled) => (
                Some(cycled.start_date()),
                Some(cycled.end_date()),
                cycled.non_teaching_day(),
            ),
            ScheduleVariant::Calendar(calendar) => (None, None, calendar.non_teaching_day()),
        };

        Self {
            id: schedule.id(),
            group_id: schedule.group_id(),
            semester: schedule.semester(),
            kind: schedule.kind(),
            start_date,
            end_date,
            non_teaching_day,
            items: schedule.list_items().into_iter().cloned().collect(),
        }
    }

    /// Rebuilds the schedule, re-adding every item under the usual variant rules.
    pub fn into_schedule(self) -> PersistenceResult<Schedule> {
        let variant = match self.kind {
            ScheduleKind::Cycled => ScheduleVariant::Cycled(self.rebuild_cycled()?),
            ScheduleKind::Calendar => ScheduleVariant::Calendar(self.rebuild_calendar()?),
        };
        Ok(Schedule::from_parts(
            self.id,
            self.group_id,
            self.semester,
            variant,
        ))
    }

    fn rebuild_cycled(&self) -> PersistenceResult<CycledSchedule> {
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return Err(PersistenceError::InvalidData(format!(
                "cycled schedule {} has no date range",
                self.id
            )));
        };

        let mut cycled = CycledSchedule::new(start, end, self.non_teaching_day);
        cycled.set_date_range(start, end)?;

        for item in &self.items {
            let Occurrence::Recurring { week_parity } = item.occurrence else {
                return Err(PersistenceError::InvalidData(format!(
                    "cycled schedule {} holds dated item '{}'",
                    self.id, item.discipline
                )));
            };
            cycled.add_item(item.weekday, week_parity.code(), LessonInput::try_from(item)?)?;
        }
        Ok(cycled)
    }

    fn rebuild_calendar(&self) -> PersistenceResult<CalendarSchedule> {
        let mut calendar = CalendarSchedule::new(self.non_teaching_day);

        for item in &self.items {
            let Occurrence::Dated { date, week_number } = item.occurrence else {
                return Err(PersistenceError::InvalidData(format!(
                    "calendar schedule {} holds undated item '{}'",
                    self.id, item.discipline
                )));
            };
            let week_number = i32::try_from(week_number).map_err(|_| {
                PersistenceError::InvalidData(format!("week number {week_number} is out of range"))
            })?;
            calendar.add_item(date, week_number, LessonInput::try_from(item)?)?;
        }
        Ok(calendar)
    }
}

/// Process-local store, keyed by schedule id.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    schedules: Mutex<BTreeMap<Uuid, ScheduleSnapshot>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let snapshot = ScheduleSnapshot::from_schedule(schedule);
        let mut schedules = self
            .schedules
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        schedules.insert(snapshot.id, snapshot);
        Ok(())
    }

    fn load_schedule(&self, id: Uuid) -> PersistenceResult<Option<Schedule>> {
        let snapshot = {
            let schedules = self
                .schedules
                .lock()
                .map_err(|_| PersistenceError::LockPoisoned)?;
            schedules.get(&id).cloned()
        };
        snapshot.map(ScheduleSnapshot::into_schedule).transpose()
    }

    fn list_schedules(&self) -> PersistenceResult<Vec<Schedule>> {
        let snapshots: Vec<ScheduleSnapshot> = {
            let schedules = self
                .schedules
                .lock()
                .map_err(|_| PersistenceError::LockPoisoned)?;
            schedules.values().cloned().collect()
        };
        snapshots
            .into_iter()
            .map(ScheduleSnapshot::into_schedule)
            .collect()
    }

    fn delete_schedule(&self, id: Uuid) -> PersistenceResult<bool> {
        let mut schedules = self
            .schedules
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(schedules.remove(&id).is_some())
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod file;

pub use file::{load_schedule_from_json, save_schedule_to_json};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::AcademicCalendar;
    use crate::item::{Cabinet, WeekParity};

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule() -> Schedule {
        let cal = AcademicCalendar::default();
        let mut schedule =
            Schedule::new_cycled(&cal, Uuid::new_v4(), 1, d(2025, 9, 1), d(2025, 12, 27), 2025, 2025)
                .unwrap();
        schedule
            .as_cycled_mut()
            .unwrap()
            .add_item(
                Weekday::Tue,
                WeekParity::Odd.code(),
                LessonInput::new("Databases", Uuid::nil(), Cabinet::new("4", "402")),
            )
            .unwrap();
        schedule
    }

    #[test]
    fn snapshot_rebuilds_same_schedule() {
        let original = schedule();
        let rebuilt = ScheduleSnapshot::from_schedule(&original)
            .into_schedule()
            .unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn conflicting_snapshot_is_rejected() {
        let mut snapshot = ScheduleSnapshot::from_schedule(&schedule());
        let mut clash = snapshot.items[0].clone();
        clash.occurrence = Occurrence::Recurring {
            week_parity: WeekParity::Both,
        };
        snapshot.items.push(clash);

        let err = snapshot.into_schedule().unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Domain(ScheduleError::ItemConflict { .. })
        ));
    }

    #[test]
    fn cycled_snapshot_needs_date_range() {
        let mut snapshot = ScheduleSnapshot::from_schedule(&schedule());
        snapshot.end_date = None;
        assert!(matches!(
            snapshot.into_schedule(),
            Err(PersistenceError::InvalidData(_))
        ));
    }

    #[test]
    fn memory_store_replaces_and_deletes() {
        let store = InMemoryScheduleStore::new();
        let mut schedule = schedule();
        store.save_schedule(&schedule).unwrap();

        schedule.clear_items();
        store.save_schedule(&schedule).unwrap();
        let loaded = store.load_schedule(schedule.id()).unwrap().unwrap();
        assert_eq!(loaded.item_count(), 0);

        assert_eq!(store.list_schedules_by_group(schedule.group_id()).unwrap().len(), 1);
        assert!(store.delete_schedule(schedule.id()).unwrap());
        assert!(!store.delete_schedule(schedule.id()).unwrap());
        assert!(store.load_schedule(schedule.id()).unwrap().is_none());
    }
}
