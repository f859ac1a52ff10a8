pub mod calendar;
pub mod error;
pub mod export;
pub mod item;
mod item_validation;
pub mod persistence;
pub mod projection;
pub mod schedule;

pub use calendar::{AcademicCalendar, AcademicCalendarConfig, CalendarDay, WeekInfo};
pub use error::{ErrorKind, ScheduleError, ScheduleResult, Violation, Violations};
pub use item::{Cabinet, LessonInput, LessonKind, Occurrence, ScheduleItem, WeekParity};
pub use persistence::{InMemoryScheduleStore, PersistenceError, ScheduleSnapshot, ScheduleStore};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteScheduleStore;
pub use projection::ScheduleProjector;
pub use schedule::{
    CalendarItemKey, CalendarSchedule, CycledItemKey, CycledSchedule, Schedule, ScheduleKind,
    ScheduleUpdate, ScheduleVariant,
};
