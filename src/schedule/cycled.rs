use chrono::{NaiveDate, Weekday};

use crate::error::{ConflictScope, ScheduleError, ScheduleResult, Violations};
use crate::item::{LessonInput, Occurrence, ScheduleItem, WeekParity};
use crate::item_validation::{self, CheckedLesson};

const WEEK_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn day_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

/// Two recurring items collide when they share a lesson period, at least one week and at
/// least one student.
pub fn items_conflict(a: &ScheduleItem, b: &ScheduleItem) -> bool {
    let parity_a = a.week_parity().unwrap_or(WeekParity::Both);
    let parity_b = b.week_parity().unwrap_or(WeekParity::Both);

    a.weekday == b.weekday
        && a.lesson_number == b.lesson_number
        && parity_a.overlaps(parity_b)
        && a.shares_students_with(b)
}

/// Address of a recurring item, in caller-supplied raw form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycledItemKey {
    pub weekday: Weekday,
    pub lesson_number: i8,
    pub subgroup: i8,
    pub week_parity: i8,
}

/// Weekly-recurring lesson pattern valid between two dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycledSchedule {
    start_date: NaiveDate,
    end_date: NaiveDate,
    non_teaching_day: Weekday,
    items: [Vec<ScheduleItem>; 7],
}

impl CycledSchedule {
    pub(crate) fn new(start_date: NaiveDate, end_date: NaiveDate, non_teaching_day: Weekday) -> Self {
        Self {
            start_date,
            end_date,
            non_teaching_day,
            items: Default::default(),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn non_teaching_day(&self) -> Weekday {
        self.non_teaching_day
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> ScheduleResult<()> {
        if start > end {
            return Err(ScheduleError::invalid(
                "start_date",
                format!("start date {start} is after end date {end}"),
            ));
        }
        self.start_date = start;
        self.end_date = end;
        Ok(())
    }

    /// All items ordered by weekday from Monday, insertion order within a day.
    pub fn list_items(&self) -> Vec<&ScheduleItem> {
        WEEK_ORDER
            .iter()
            .flat_map(|day| self.items[day_index(*day)].iter())
            .collect()
    }

    pub fn list_items_by_weekday(&self, weekday: Weekday) -> &[ScheduleItem] {
        &self.items[day_index(weekday)]
    }

    pub fn len(&self) -> usize {
        self.items.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        for day in &mut self.items {
            day.clear();
        }
    }

    pub fn add_item(
        &mut self,
        weekday: Weekday,
        week_parity: i8,
        lesson: LessonInput,
    ) -> ScheduleResult<()> {
        let item = self.build_item(weekday, week_parity, &lesson)?;
        self.insert(item)
    }

    /// Removes the item at exactly this weekday, period, subgroup and parity.
    pub fn remove_item(
        &mut self,
        weekday: Weekday,
        lesson_number: i8,
        subgroup: i8,
        week_parity: i8,
    ) -> ScheduleResult<ScheduleItem> {
        let key = CycledItemKey {
            weekday,
            lesson_number,
            subgroup,
            week_parity,
        };
        let idx = self.position(&key)?;
        Ok(self.items[day_index(weekday)].remove(idx))
    }

    /// Swaps the item at `key` for a new one. On any failure the schedule is left as it was.
    pub fn replace_item(
        &mut self,
        key: CycledItemKey,
        weekday: Weekday,
        week_parity: i8,
        lesson: LessonInput,
    ) -> ScheduleResult<ScheduleItem> {
        let replacement = self.build_item(weekday, week_parity, &lesson)?;
        let idx = self.position(&key)?;
        let removed = self.items[day_index(key.weekday)].remove(idx);

        match self.insert(replacement) {
            Ok(()) => Ok(removed),
            Err(err) => {
                self.items[day_index(key.weekday)].insert(idx, removed);
                Err(err)
            }
        }
    }

    pub fn find_conflict(&self, item: &ScheduleItem) -> Option<&ScheduleItem> {
        self.items[day_index(item.weekday)]
            .iter()
            .find(|current| items_conflict(current, item))
    }

    /// Re-checks stored items; used when validating a rebuilt aggregate.
    pub(crate) fn check_items(&self, violations: &mut Violations) {
        for (idx, day) in self.items.iter().enumerate() {
            for item in day {
                if item.weekday == self.non_teaching_day {
                    violations.push(
                        "items",
                        format!("'{}' is placed on {}", item.discipline, item.weekday),
                    );
                }
                if day_index(item.weekday) != idx {
                    violations.push(
                        "items",
                        format!("'{}' is filed under the wrong weekday", item.discipline),
                    );
                }
                if item.week_parity().is_none() {
                    violations.push(
                        "items",
                        format!("'{}' has no week type in a cycled schedule", item.discipline),
                    );
                }
            }
            for (i, a) in day.iter().enumerate() {
                for b in &day[i + 1..] {
                    if items_conflict(a, b) {
                        violations.push(
                            "items",
                            format!(
                                "'{}' and '{}' share lesson {} on {}",
                                a.discipline, b.discipline, a.lesson_number, a.weekday
                            ),
                        );
                    }
                }
            }
        }
    }

    fn build_item(
        &self,
        weekday: Weekday,
        week_parity: i8,
        lesson: &LessonInput,
    ) -> ScheduleResult<ScheduleItem> {
        let mut violations = Violations::new();

        if weekday == self.non_teaching_day {
            violations.push("weekday", format!("item can not be created for {weekday}"));
        }
        let checked = item_validation::check_lesson(lesson, &mut violations);
        let parity = item_validation::check_week_parity(week_parity, &mut violations);

        match (checked, parity) {
            (Some(lesson), Some(week_parity)) if violations.is_empty() => {
                Ok(recurring_item(lesson, weekday, week_parity))
            }
            _ => Err(ScheduleError::InvalidData(violations)),
        }
    }

    fn insert(&mut self, item: ScheduleItem) -> ScheduleResult<()> {
        if let Some(current) = self.find_conflict(&item) {
            return Err(ScheduleError::ItemConflict {
                lesson_number: item.lesson_number,
                scope: ConflictScope::Weekday {
                    weekday: current.weekday,
                    subgroup: current.subgroup,
                    week_parity: current.week_parity().unwrap_or(WeekParity::Both),
                },
            });
        }
        self.items[day_index(item.weekday)].push(item);
        Ok(())
    }

    fn position(&self, key: &CycledItemKey) -> ScheduleResult<usize> {
        let mut violations = Violations::new();
        let lesson_number = item_validation::check_lesson_number(key.lesson_number, &mut violations);
        let subgroup = item_validation::check_subgroup(key.subgroup, &mut violations);
        let parity = item_validation::check_week_parity(key.week_parity, &mut violations);

        let (Some(lesson_number), Some(subgroup), Some(parity)) = (lesson_number, subgroup, parity)
        else {
            return Err(ScheduleError::InvalidData(violations));
        };

        self.items[day_index(key.weekday)]
            .iter()
            .position(|item| {
                item.lesson_number == lesson_number
                    && item.subgroup == subgroup
                    && item.week_parity() == Some(parity)
            })
            .ok_or(ScheduleError::ItemNotFound)
    }
}

fn recurring_item(lesson: CheckedLesson, weekday: Weekday, week_parity: WeekParity) -> ScheduleItem {
    ScheduleItem {
        discipline: lesson.discipline,
        teacher_id: lesson.teacher_id,
        weekday,
        students_count: lesson.students_count,
        lesson_number: lesson.lesson_number,
        subgroup: lesson.subgroup,
        lesson_kind: lesson.lesson_kind,
        cabinet: lesson.cabinet,
        occurrence: Occurrence::Recurring { week_parity },
    }
}
