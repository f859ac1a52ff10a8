use chrono::{Datelike, NaiveDate, Weekday};

use crate::calendar::CalendarDay;
use crate::error::{ConflictScope, ScheduleError, ScheduleResult, Violations};
use crate::item::{LessonInput, Occurrence, ScheduleItem};
use crate::item_validation;

/// Address of a dated item, in caller-supplied raw form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarItemKey {
    pub date: NaiveDate,
    pub lesson_number: i8,
    pub subgroup: i8,
}

/// Flat list of lessons pinned to concrete dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSchedule {
    non_teaching_day: Weekday,
    items: Vec<ScheduleItem>,
}

impl CalendarSchedule {
    pub(crate) fn new(non_teaching_day: Weekday) -> Self {
        Self {
            non_teaching_day,
            items: Vec::new(),
        }
    }

    pub fn non_teaching_day(&self) -> Weekday {
        self.non_teaching_day
    }

    /// Items in insertion order.
    pub fn list_items(&self) -> Vec<&ScheduleItem> {
        self.items.iter().collect()
    }

    pub fn list_items_by_date(&self, date: NaiveDate) -> Vec<&ScheduleItem> {
        self.items
            .iter()
            .filter(|item| item.date() == Some(date))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Adds a lesson on `date`. Only the calendar day of `date` is kept.
    pub fn add_item<D: CalendarDay>(
        &mut self,
        date: D,
        week_number: i32,
        lesson: LessonInput,
    ) -> ScheduleResult<()> {
        let item = self.build_item(date.calendar_day(), week_number, &lesson)?;
        self.insert(item)
    }

    pub fn remove_item<D: CalendarDay>(
        &mut self,
        date: D,
        lesson_number: i8,
        subgroup: i8,
    ) -> ScheduleResult<ScheduleItem> {
        let key = CalendarItemKey {
            date: date.calendar_day(),
            lesson_number,
            subgroup,
        };
        let idx = self.position(&key)?;
        Ok(self.items.remove(idx))
    }

    /// Swaps the item at `key` for a new one. On any failure the schedule is left as it was.
    pub fn replace_item<D: CalendarDay>(
        &mut self,
        key: CalendarItemKey,
        date: D,
        week_number: i32,
        lesson: LessonInput,
    ) -> ScheduleResult<ScheduleItem> {
        let replacement = self.build_item(date.calendar_day(), week_number, &lesson)?;
        let idx = self.position(&key)?;
        let removed = self.items.remove(idx);

        match self.insert(replacement) {
            Ok(()) => Ok(removed),
            Err(err) => {
                self.items.insert(idx, removed);
                Err(err)
            }
        }
    }

    pub fn find_conflict(&self, item: &ScheduleItem) -> Option<&ScheduleItem> {
        self.items.iter().find(|current| same_slot(current, item))
    }

    /// Appends an already dated item, still refusing duplicates.
    pub(crate) fn push_dated(&mut self, item: ScheduleItem) -> ScheduleResult<()> {
        if item.date().is_none() {
            return Err(ScheduleError::invalid(
                "date",
                format!("'{}' has no date in a calendar schedule", item.discipline),
            ));
        }
        self.insert(item)
    }

    pub(crate) fn check_items(&self, violations: &mut Violations) {
        for item in &self.items {
            match item.occurrence {
                Occurrence::Dated { date, week_number } => {
                    if date.weekday() == self.non_teaching_day {
                        violations.push(
                            "items",
                            format!("'{}' is placed on {} {date}", item.discipline, date.weekday()),
                        );
                    }
                    if week_number == 0 {
                        violations.push(
                            "items",
                            format!("'{}' on {date} has week number 0", item.discipline),
                        );
                    }
                }
                Occurrence::Recurring { .. } => violations.push(
                    "items",
                    format!("'{}' has no date in a calendar schedule", item.discipline),
                ),
            }
        }
        for (i, a) in self.items.iter().enumerate() {
            for b in &self.items[i + 1..] {
                if same_slot(a, b) {
                    violations.push(
                        "items",
                        format!(
                            "'{}' and '{}' share lesson {} subgroup {}",
                            a.discipline, b.discipline, a.lesson_number, a.subgroup
                        ),
                    );
                }
            }
        }
    }

    fn build_item(
        &self,
        date: NaiveDate,
        week_number: i32,
        lesson: &LessonInput,
    ) -> ScheduleResult<ScheduleItem> {
        let mut violations = Violations::new();

        let week_number = item_validation::check_week_number(week_number, &mut violations);
        let weekday = date.weekday();
        if weekday == self.non_teaching_day {
            violations.push(
                "date",
                format!("schedule item can not be added for {weekday} {date}"),
            );
        }
        let checked = item_validation::check_lesson(lesson, &mut violations);

        match (checked, week_number) {
            (Some(lesson), Some(week_number)) if violations.is_empty() => Ok(ScheduleItem {
                discipline: lesson.discipline,
                teacher_id: lesson.teacher_id,
                weekday,
                students_count: lesson.students_count,
                lesson_number: lesson.lesson_number,
                subgroup: lesson.subgroup,
                lesson_kind: lesson.lesson_kind,
                cabinet: lesson.cabinet,
                occurrence: Occurrence::Dated { date, week_number },
            }),
            _ => Err(ScheduleError::InvalidData(violations)),
        }
    }

    fn insert(&mut self, item: ScheduleItem) -> ScheduleResult<()> {
        if let Some(current) = self.find_conflict(&item) {
            let date = current.date().unwrap_or_default();
            return Err(ScheduleError::ItemConflict {
                lesson_number: item.lesson_number,
                scope: ConflictScope::Date {
                    date,
                    subgroup: current.subgroup,
                },
            });
        }
        self.items.push(item);
        Ok(())
    }

    fn position(&self, key: &CalendarItemKey) -> ScheduleResult<usize> {
        let mut violations = Violations::new();
        let lesson_number = item_validation::check_lesson_number(key.lesson_number, &mut violations);
        let subgroup = item_validation::check_subgroup(key.subgroup, &mut violations);

        let (Some(lesson_number), Some(subgroup)) = (lesson_number, subgroup) else {
            return Err(ScheduleError::InvalidData(violations));
        };

        self.items
            .iter()
            .position(|item| {
                item.date() == Some(key.date)
                    && item.lesson_number == lesson_number
                    && item.subgroup == subgroup
            })
            .ok_or(ScheduleError::ItemNotFound)
    }
}

fn same_slot(a: &ScheduleItem, b: &ScheduleItem) -> bool {
    a.date() == b.date() && a.lesson_number == b.lesson_number && a.subgroup == b.subgroup
}
