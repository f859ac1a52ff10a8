use chrono::{Days, NaiveDate, Weekday};
use lesson_schedule::{
    AcademicCalendar, Cabinet, ErrorKind, LessonInput, Schedule, ScheduleItem, ScheduleResult,
    WeekParity,
};
use proptest::prelude::*;
use uuid::Uuid;

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const TEACHING_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, Clone)]
struct Placement {
    weekday: Weekday,
    week_parity: i8,
    lesson_number: i8,
    subgroup: i8,
}

impl Placement {
    fn add_to(&self, schedule: &mut Schedule) -> ScheduleResult<()> {
        let input = LessonInput {
            lesson_number: self.lesson_number,
            subgroup: self.subgroup,
            ..LessonInput::new("Subject", Uuid::nil(), Cabinet::new("1", "1"))
        };
        schedule
            .as_cycled_mut()?
            .add_item(self.weekday, self.week_parity, input)
    }
}

fn empty_schedule() -> Schedule {
    let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 12, 28).unwrap();
    Schedule::new_cycled(
        &AcademicCalendar::default(),
        Uuid::nil(),
        1,
        start,
        end,
        2025,
        2025,
    )
    .unwrap()
}

fn placement() -> impl Strategy<Value = Placement> {
    (0..TEACHING_DAYS.len(), 0i8..3, 0i8..3, 0i8..4).prop_map(
        |(day, week_parity, lesson_number, subgroup)| Placement {
            weekday: TEACHING_DAYS[day],
            week_parity,
            lesson_number,
            subgroup,
        },
    )
}

fn conflicts_after(first: &Placement, second: &Placement) -> bool {
    let mut schedule = empty_schedule();
    first.add_to(&mut schedule).unwrap();
    match second.add_to(&mut schedule) {
        Ok(()) => false,
        Err(err) => {
            assert_eq!(err.kind(), ErrorKind::ItemConflict);
            true
        }
    }
}

proptest! {
    #[test]
    fn conflict_is_order_independent(a in placement(), b in placement()) {
        prop_assert_eq!(conflicts_after(&a, &b), conflicts_after(&b, &a));
    }

    #[test]
    fn weekly_whole_group_item_owns_its_slot(other in placement()) {
        let anchor = Placement {
            week_parity: WeekParity::Both.code(),
            subgroup: 0,
            ..other.clone()
        };
        prop_assert!(conflicts_after(&anchor, &other));
    }

    #[test]
    fn rejected_add_changes_nothing(
        day in 0usize..7,
        week_parity in -2i8..5,
        lesson_number in -3i8..4,
        subgroup in -3i8..4,
        students_count in -5i16..40,
    ) {
        let weekday = ALL_DAYS[day];
        let mut schedule = empty_schedule();
        Placement { weekday: Weekday::Mon, week_parity: 2, lesson_number: 0, subgroup: 0 }
            .add_to(&mut schedule)
            .unwrap();
        let before: Vec<ScheduleItem> = schedule.list_items().into_iter().cloned().collect();

        let input = LessonInput {
            lesson_number,
            subgroup,
            students_count,
            ..LessonInput::new("Subject", Uuid::nil(), Cabinet::new("1", "1"))
        };
        let invalid = weekday == Weekday::Sun
            || !(0..=2).contains(&week_parity)
            || lesson_number < 0
            || subgroup < 0
            || students_count < 0;

        let result = schedule
            .as_cycled_mut()
            .unwrap()
            .add_item(weekday, week_parity, input);

        match result {
            Ok(()) => {
                prop_assert!(!invalid);
                prop_assert_eq!(schedule.item_count(), before.len() + 1);
            }
            Err(err) => {
                if invalid {
                    prop_assert_eq!(err.kind(), ErrorKind::InvalidData);
                }
                let after: Vec<ScheduleItem> =
                    schedule.list_items().into_iter().cloned().collect();
                prop_assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn week_info_is_deterministic(offset in 0u64..400) {
        let cal = AcademicCalendar::default();
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let date = start.checked_add_days(Days::new(offset)).unwrap();

        let first = cal.week_info(start, date).unwrap();
        let second = cal.week_info(start, date).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(u64::from(first.week_number), offset / 7 + 1);
        if let Some(parity) = first.parity {
            prop_assert_eq!(parity, WeekParity::for_week(first.week_number));
        }
    }
}

