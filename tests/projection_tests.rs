use chrono::{Datelike, NaiveDate, Weekday};
use lesson_schedule::{
    AcademicCalendar, AcademicCalendarConfig, Cabinet, ErrorKind, LessonInput, LessonKind, Schedule, ScheduleError,
    ScheduleItem, ScheduleProjector, WeekParity,
};
use uuid::Uuid;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn lesson(discipline: &str, lesson_number: i8, subgroup: i8) -> LessonInput {
    LessonInput {
        lesson_number,
        subgroup,
        lesson_kind: LessonKind::Seminar.code(),
        ..LessonInput::new(discipline, Uuid::nil(), Cabinet::new("3", "7"))
    }
}

fn autumn(end: NaiveDate) -> Schedule {
    Schedule::new_cycled(
        &AcademicCalendar::default(),
        Uuid::new_v4(),
        1,
        d(2025, 9, 1),
        end,
        2025,
        2025,
    )
    .unwrap()
}

#[test]
fn lookup_before_education_start_fails() {
    let cal = AcademicCalendar::default();
    let schedule = autumn(d(2025, 12, 28));
    let start = cal.education_start(2025, 1).unwrap();

    let err = ScheduleProjector::new(&cal)
        .items_on_date(schedule.as_cycled().unwrap(), start, d(2025, 8, 31))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::DateBeforeEducationStart { .. }));
    assert_eq!(err.kind(), ErrorKind::Projection);
}

#[test]
fn one_week_one_monday_item() {
    let cal = AcademicCalendar::default();
    let mut schedule = autumn(d(2025, 9, 7));
    schedule
        .as_cycled_mut()
        .unwrap()
        .add_item(Weekday::Mon, WeekParity::Both.code(), lesson("Ethics", 0, 0))
        .unwrap();

    let start = cal.education_start(2025, 1).unwrap();
    let calendar = ScheduleProjector::new(&cal)
        .materialize_calendar(&schedule, start)
        .unwrap();

    let items = calendar.list_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].date(), Some(d(2025, 9, 1)));
    assert_eq!(items[0].week_number(), Some(1));
    assert_eq!(items[0].lesson_kind, LessonKind::Seminar);
}

#[test]
fn alternating_weeks_materialize_on_matching_weeks_only() {
    let cal = AcademicCalendar::default();
    let mut schedule = autumn(d(2025, 9, 28));
    let cycled = schedule.as_cycled_mut().unwrap();
    cycled
        .add_item(Weekday::Tue, WeekParity::Odd.code(), lesson("Odd", 1, 0))
        .unwrap();
    cycled
        .add_item(Weekday::Tue, WeekParity::Even.code(), lesson("Even", 1, 0))
        .unwrap();

    let start = cal.education_start(2025, 1).unwrap();
    let calendar = ScheduleProjector::new(&cal)
        .materialize_calendar(&schedule, start)
        .unwrap();

    let seen: Vec<(NaiveDate, String)> = calendar
        .list_items()
        .into_iter()
        .map(|item| (item.date().unwrap(), item.discipline.clone()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (d(2025, 9, 2), "Odd".to_string()),
            (d(2025, 9, 9), "Even".to_string()),
            (d(2025, 9, 16), "Odd".to_string()),
            (d(2025, 9, 23), "Even".to_string()),
        ]
    );
}

#[test]
fn materialized_calendar_matches_daily_lookups() {
    let cal = AcademicCalendar::default();
    let mut schedule = autumn(d(2025, 10, 12));
    let cycled = schedule.as_cycled_mut().unwrap();
    cycled
        .add_item(Weekday::Mon, WeekParity::Both.code(), lesson("Analysis", 0, 0))
        .unwrap();
    cycled
        .add_item(Weekday::Wed, WeekParity::Odd.code(), lesson("Lab A", 2, 1))
        .unwrap();
    cycled
        .add_item(Weekday::Wed, WeekParity::Even.code(), lesson("Lab B", 2, 2))
        .unwrap();
    cycled
        .add_item(Weekday::Sat, WeekParity::Even.code(), lesson("Sport", 4, 0))
        .unwrap();

    let start = cal.education_start(2025, 1).unwrap();
    let projector = ScheduleProjector::new(&cal);
    let materialized = projector.materialize_calendar(&schedule, start).unwrap();
    let calendar = materialized.as_calendar().unwrap();
    let cycled = schedule.as_cycled().unwrap();

    let mut date = cycled.start_date();
    while date <= cycled.end_date() {
        let direct = projector.items_on_date(cycled, start, date).unwrap();
        let stored: Vec<ScheduleItem> = calendar
            .list_items_by_date(date)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(direct, stored, "mismatch on {date}");
        if date.weekday() == Weekday::Sun {
            assert!(direct.is_empty());
        }
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn materializing_a_range_before_start_names_first_bad_day() {
    let cal = AcademicCalendar::default();
    let schedule = Schedule::new_cycled(
        &cal,
        Uuid::new_v4(),
        1,
        d(2025, 8, 25),
        d(2025, 9, 7),
        2025,
        2025,
    )
    .unwrap();

    let err = ScheduleProjector::new(&cal)
        .materialize_calendar(&schedule, d(2025, 9, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Projection);
    assert!(err.to_string().starts_with("get items for date 2025-08-25"));
}

#[test]
fn calendar_with_another_rest_day_refuses_to_project() {
    let mut schedule = autumn(d(2025, 9, 13));
    schedule
        .as_cycled_mut()
        .unwrap()
        .add_item(Weekday::Sat, WeekParity::Both.code(), lesson("Drawing", 0, 0))
        .unwrap();

    let saturday_rest = AcademicCalendar::from_config(&AcademicCalendarConfig {
        non_teaching_day: Weekday::Sat,
        ..AcademicCalendarConfig::default()
    })
    .unwrap();
    let start = saturday_rest.education_start(2025, 1).unwrap();
    let projector = ScheduleProjector::new(&saturday_rest);

    let err = projector
        .items_on_date(schedule.as_cycled().unwrap(), start, d(2025, 9, 6))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    let err = projector.materialize_calendar(&schedule, start).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.violations().unwrap().fields().contains(&"non_teaching_day"));
}
