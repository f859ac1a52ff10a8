use crate::error::Violations;
use crate::item::{Cabinet, LessonInput, LessonKind, WeekParity};
use uuid::Uuid;

/// Lesson fields after every range and enum check has passed.
#[derive(Debug, Clone)]
pub(crate) struct CheckedLesson {
    pub discipline: String,
    pub teacher_id: Uuid,
    pub students_count: u16,
    pub lesson_number: u8,
    pub subgroup: u8,
    pub lesson_kind: LessonKind,
    pub cabinet: Cabinet,
}

pub(crate) fn check_lesson_number(value: i8, violations: &mut Violations) -> Option<u8> {
    match u8::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            violations.push("lesson_number", format!("invalid lesson number {value}"));
            None
        }
    }
}

pub(crate) fn check_subgroup(value: i8, violations: &mut Violations) -> Option<u8> {
    match u8::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            violations.push("subgroup", format!("invalid subgroup {value}"));
            None
        }
    }
}

pub(crate) fn check_week_parity(code: i8, violations: &mut Violations) -> Option<WeekParity> {
    let parity = WeekParity::from_code(code);
    if parity.is_none() {
        violations.push("week_parity", format!("unknown week type {code}"));
    }
    parity
}

pub(crate) fn check_week_number(value: i32, violations: &mut Violations) -> Option<u32> {
    match u32::try_from(value) {
        Ok(v) if v >= 1 => Some(v),
        _ => {
            violations.push("week_number", format!("invalid week number {value}"));
            None
        }
    }
}

fn check_cabinet(cabinet: &Cabinet, violations: &mut Violations) {
    if cabinet.building.trim().is_empty() {
        violations.push("cabinet.building", "empty building");
    }
    if cabinet.auditorium.trim().is_empty() {
        violations.push("cabinet.auditorium", "empty auditorium");
    }
}

/// Records every problem with `input`; returns the checked fields only when none was found
/// by this call.
pub(crate) fn check_lesson(input: &LessonInput, violations: &mut Violations) -> Option<CheckedLesson> {
    let before = violations.len();

    if input.discipline.trim().is_empty() {
        violations.push("discipline", "empty discipline");
    }

    let students_count = match u16::try_from(input.students_count) {
        Ok(v) => Some(v),
        Err(_) => {
            violations.push(
                "students_count",
                format!("invalid students count {}", input.students_count),
            );
            None
        }
    };

    let lesson_number = check_lesson_number(input.lesson_number, violations);
    let subgroup = check_subgroup(input.subgroup, violations);

    let lesson_kind = LessonKind::from_code(input.lesson_kind);
    if lesson_kind.is_none() {
        violations.push(
            "lesson_kind",
            format!("unknown lesson type {}", input.lesson_kind),
        );
    }

    check_cabinet(&input.cabinet, violations);

    if violations.len() != before {
        return None;
    }

    Some(CheckedLesson {
        discipline: input.discipline.clone(),
        teacher_id: input.teacher_id,
        students_count: students_count?,
        lesson_number: lesson_number?,
        subgroup: subgroup?,
        lesson_kind: lesson_kind?,
        cabinet: input.cabinet.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> LessonInput {
        LessonInput::new("Physics", Uuid::new_v4(), Cabinet::new("2", "214"))
    }

    #[test]
    fn valid_input_passes() {
        let mut violations = Violations::new();
        let checked = check_lesson(&input(), &mut violations).expect("valid lesson");
        assert!(violations.is_empty());
        assert_eq!(checked.lesson_kind, LessonKind::Lecture);
    }

    #[test]
    fn every_bad_field_is_reported() {
        let mut bad = input();
        bad.discipline = "  ".into();
        bad.students_count = -3;
        bad.lesson_number = -1;
        bad.subgroup = -1;
        bad.lesson_kind = 9;
        bad.cabinet = Cabinet::new("", "");

        let mut violations = Violations::new();
        assert!(check_lesson(&bad, &mut violations).is_none());
        assert_eq!(
            violations.fields(),
            vec![
                "discipline",
                "students_count",
                "lesson_number",
                "subgroup",
                "lesson_kind",
                "cabinet.building",
                "cabinet.auditorium",
            ]
        );
    }

    #[test]
    fn earlier_violations_block_result() {
        let mut violations = Violations::new();
        violations.push("weekday", "item can not be created for Sun");
        // The lesson itself is fine, the call only reports its own findings.
        assert!(check_lesson(&input(), &mut violations).is_some());
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn week_number_must_be_positive() {
        let mut violations = Violations::new();
        assert_eq!(check_week_number(0, &mut violations), None);
        assert_eq!(check_week_number(-4, &mut violations), None);
        assert_eq!(check_week_number(3, &mut violations), Some(3));
        assert_eq!(violations.len(), 2);
    }
}
