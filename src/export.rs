//! Row-oriented CSV timetable export.
//!
//! Two layouts exist, one per schedule kind. Both print lesson periods 1-based, weekdays as
//! 0 = Sunday through 6 = Saturday and the whole group as an empty subgroup cell.

use chrono::Datelike;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::io;
use thiserror::Error;
use uuid::Uuid;

use crate::item::ScheduleItem;
use crate::schedule::{Schedule, ScheduleKind};

pub const CYCLED_HEADER: [&str; 14] = [
    "Group",
    "Day",
    "Les",
    "Aud",
    "Week",
    "Subg",
    "Name",
    "Caf",
    "Subject",
    "Subj_Type",
    "Start",
    "End",
    "Subj_CafID",
    "PrepID",
];

/// The last seven columns are always written empty.
pub const CALENDAR_HEADER: [&str; 22] = [
    "Group",
    "StudInLesson",
    "Day",
    "Les",
    "Aud",
    "Week",
    "Subg",
    "Name",
    "CafID",
    "Subject",
    "Subj_Type",
    "Date",
    "Subj_CafID",
    "PrepID",
    "Themas",
    "Substitution_Name",
    "Substitution_PrepID",
    "Substitution_Subject",
    "Substitution_Subj_type",
    "Substitution_Subj_CafID",
    "Lesson_ID",
    "Lesson_Num",
];

const NO_BOUND: &str = "-100";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown teacher {0}")]
    UnknownTeacher(Uuid),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Display data for a teacher referenced by schedule items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherInfo {
    pub name: String,
    pub external_id: String,
    pub department_external_id: String,
}

pub trait TeacherDirectory {
    fn teacher(&self, id: Uuid) -> Option<&TeacherInfo>;
}

impl<S: BuildHasher> TeacherDirectory for HashMap<Uuid, TeacherInfo, S> {
    fn teacher(&self, id: Uuid) -> Option<&TeacherInfo> {
        self.get(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Writes `schedule` as CSV and returns the number of item rows.
///
/// Every teacher is resolved before the first byte is written, so an unknown teacher leaves
/// `writer` untouched.
pub fn export_csv<D, W>(
    schedule: &Schedule,
    group_number: &str,
    teachers: &D,
    writer: W,
    options: &ExportOptions,
) -> ExportResult<usize>
where
    D: TeacherDirectory + ?Sized,
    W: io::Write,
{
    let kind = schedule.kind();
    let header: &[&str] = match kind {
        ScheduleKind::Cycled => &CYCLED_HEADER,
        ScheduleKind::Calendar => &CALENDAR_HEADER,
    };

    let mut rows = Vec::with_capacity(schedule.item_count());
    for item in schedule.list_items() {
        let teacher = teachers
            .teacher(item.teacher_id)
            .ok_or(ExportError::UnknownTeacher(item.teacher_id))?;
        let mut row = match kind {
            ScheduleKind::Cycled => cycled_row(group_number, item, teacher),
            ScheduleKind::Calendar => calendar_row(group_number, item, teacher),
        };
        row.resize(header.len(), String::new());
        rows.push(row);
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    csv_writer.write_record(header)?;
    for row in &rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;

    log::debug!(
        "exported {} rows of {kind} schedule {}",
        rows.len(),
        schedule.id()
    );
    Ok(rows.len())
}

fn cycled_row(group_number: &str, item: &ScheduleItem, teacher: &TeacherInfo) -> Vec<String> {
    let week = item
        .week_parity()
        .map(|parity| parity.short_label())
        .unwrap_or_default();

    vec![
        group_number.to_string(),
        weekday_cell(item),
        lesson_cell(item),
        item.cabinet.address(),
        week.to_string(),
        subgroup_cell(item),
        teacher.name.clone(),
        teacher.department_external_id.clone(),
        item.discipline.clone(),
        item.lesson_kind.short_label().to_string(),
        NO_BOUND.to_string(),
        NO_BOUND.to_string(),
        "0".to_string(),
        teacher.external_id.clone(),
    ]
}

fn calendar_row(group_number: &str, item: &ScheduleItem, teacher: &TeacherInfo) -> Vec<String> {
    let date = item
        .date()
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_default();

    vec![
        group_number.to_string(),
        item.students_count.to_string(),
        weekday_cell(item),
        lesson_cell(item),
        item.cabinet.address(),
        item.week_number().unwrap_or(0).to_string(),
        subgroup_cell(item),
        teacher.name.clone(),
        teacher.department_external_id.clone(),
        item.discipline.clone(),
        item.lesson_kind.short_label().to_string(),
        date,
        String::new(),
        teacher.external_id.clone(),
        String::new(),
    ]
}

fn weekday_cell(item: &ScheduleItem) -> String {
    let weekday = item.date().map_or(item.weekday, |date| date.weekday());
    weekday.num_days_from_sunday().to_string()
}

fn lesson_cell(item: &ScheduleItem) -> String {
    (u16::from(item.lesson_number) + 1).to_string()
}

fn subgroup_cell(item: &ScheduleItem) -> String {
    if item.is_whole_group() {
        String::new()
    } else {
        item.subgroup.to_string()
    }
}
