use chrono::{Datelike, NaiveDate, Utc, Weekday};
use lesson_schedule::calendar::{load_calendar_config, save_calendar_config};
use lesson_schedule::export::{ExportOptions, TeacherInfo, export_csv};
use lesson_schedule::persistence::{load_schedule_from_json, save_schedule_to_json};
use lesson_schedule::{
    AcademicCalendar, Cabinet, LessonInput, LessonKind, Schedule, ScheduleItem, ScheduleKind,
    ScheduleProjector, WeekParity,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const COLUMNS: [&str; 9] = [
    "day", "les", "when", "subg", "kind", "students", "aud", "discipline", "teacher",
];

struct Session {
    calendar: AcademicCalendar,
    schedule: Option<Schedule>,
    teachers: HashMap<Uuid, TeacherInfo>,
    current_teacher: Uuid,
}

impl Session {
    fn new() -> Self {
        let unassigned = Uuid::new_v4();
        let teachers = HashMap::from([(
            unassigned,
            TeacherInfo {
                name: "Unassigned".to_string(),
                external_id: String::new(),
                department_external_id: String::new(),
            },
        )]);
        Self {
            calendar: AcademicCalendar::default(),
            schedule: None,
            teachers,
            current_teacher: unassigned,
        }
    }

    fn teacher_name(&self, id: Uuid) -> &str {
        self.teachers
            .get(&id)
            .map(|teacher| teacher.name.as_str())
            .unwrap_or("?")
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn render_row(item: &ScheduleItem, teacher: &str) -> [String; 9] {
    let when = match (item.date(), item.week_number(), item.week_parity()) {
        (Some(date), Some(week), _) => format!("{date} w{week}"),
        (_, _, Some(parity)) => parity.as_str().to_string(),
        _ => String::new(),
    };
    [
        item.weekday.to_string(),
        item.lesson_number.to_string(),
        when,
        item.subgroup.to_string(),
        item.lesson_kind.short_label().to_string(),
        item.students_count.to_string(),
        item.cabinet.address(),
        item.discipline.clone(),
        teacher.to_string(),
    ]
}

fn render_items_as_text_table(session: &Session, items: &[&ScheduleItem]) -> String {
    let rows: Vec<[String; 9]> = items
        .iter()
        .map(|item| render_row(item, session.teacher_name(item.teacher_id)))
        .collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|name| name.chars().count()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_line(&mut out, COLUMNS.iter().map(|name| name.to_string()), &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        push_line(&mut out, row.into_iter(), &widths);
    }
    out.push_str(&sep);
    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.zip(widths) {
        out.push(' ');
        let pad = width.saturating_sub(cell.chars().count());
        out.push_str(&cell);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}

fn print_schedule(session: &Session) {
    match &session.schedule {
        Some(schedule) => {
            println!(
                "{} schedule {} (group {}, semester {}), {} items",
                schedule.kind(),
                schedule.id(),
                schedule.group_id(),
                schedule.semester(),
                schedule.item_count()
            );
            if let Ok(cycled) = schedule.as_cycled() {
                println!("Runs {} to {}.", cycled.start_date(), cycled.end_date());
            }
            println!(
                "{}",
                render_items_as_text_table(session, &schedule.list_items())
            );
        }
        None => println!("No schedule. Use 'new' or 'load json <path>'."),
    }
}

fn print_calendar_info(calendar: &AcademicCalendar) {
    let config = calendar.to_config();
    println!(
        "Academic year starts {:02}-{:02}, UTC offset {} min, rest day {}, up to {} semesters.",
        config.start_month,
        config.start_day,
        config.utc_offset_minutes,
        config.non_teaching_day,
        config.max_semesters
    );
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  config show|load <json>|save <json>\n                                     Show, load or save the academic calendar\n  new <semester> <start> <end> <admission_year> [current_year]\n                                     Create an empty cycled schedule\n  teacher <external_id> <department_id> <name...>\n                                     Register a teacher used by later 'add' calls\n  add <weekday> <les> <subg> <odd|even|both> <kind> <students> <building> <room> <discipline...>\n                                     Add a recurring lesson\n  remove <weekday> <les> <subg> <odd|even|both>\n                                     Remove a recurring lesson\n  show                               Show the current schedule\n  on <YYYY-MM-DD> <admission_year>   Lessons on a date\n  materialize <admission_year>       Replace the schedule by its calendar form\n  export <path> <group_number>       Write the timetable CSV\n  save json <path>                   Save the schedule\n  load json <path>                   Load a schedule\n  quit|exit                          Exit"
    );
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let mut session = Session::new();

    println!("Lesson Schedule (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_schedule(&session),
            "config" => match parts.next() {
                Some("show") | None => print_calendar_info(&session.calendar),
                Some("load") => match parts.next() {
                    Some(path) => match load_calendar_config(path) {
                        Ok(config) => match AcademicCalendar::from_config(&config) {
                            Ok(calendar) => {
                                session.calendar = calendar;
                                println!("Calendar loaded from {}.", path);
                                print_calendar_info(&session.calendar);
                            }
                            Err(e) => println!("Error applying calendar: {}", e),
                        },
                        Err(e) => println!("Error reading {}: {}", path, e),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match save_calendar_config(&session.calendar.to_config(), path) {
                        Ok(_) => println!("Calendar saved to {}.", path),
                        Err(e) => println!("Error writing {}: {}", path, e),
                    },
                    None => println!("Usage: config save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown config command '{}'.", other);
                    println!("Usage: config show|load <json_path>|save <json_path>");
                }
            },
            "new" => {
                let args: Vec<&str> = parts.collect();
                if args.len() < 4 {
                    println!("Usage: new <semester> <start> <end> <admission_year> [current_year]");
                    continue;
                }
                let semester: i32 = match args[0].parse() { Ok(v) => v, Err(_) => { println!("Invalid semester"); continue; } };
                let start = match parse_date(args[1]) { Some(d) => d, None => { println!("Invalid start date (YYYY-MM-DD)"); continue; } };
                let end = match parse_date(args[2]) { Some(d) => d, None => { println!("Invalid end date (YYYY-MM-DD)"); continue; } };
                let admission: i32 = match args[3].parse() { Ok(v) => v, Err(_) => { println!("Invalid admission year"); continue; } };
                let current: i32 = match args.get(4) {
                    Some(s) => match s.parse() { Ok(v) => v, Err(_) => { println!("Invalid current year"); continue; } },
                    None => session.calendar.local_date(Utc::now()).year(),
                };
                match Schedule::new_cycled(
                    &session.calendar,
                    Uuid::new_v4(),
                    semester,
                    start,
                    end,
                    admission,
                    current,
                ) {
                    Ok(schedule) => {
                        println!("Created cycled schedule {}.", schedule.id());
                        session.schedule = Some(schedule);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "teacher" => {
                let external_id = parts.next();
                let department = parts.next();
                let name: Vec<&str> = parts.collect();
                match (external_id, department, !name.is_empty()) {
                    (Some(external_id), Some(department), true) => {
                        let id = Uuid::new_v4();
                        session.teachers.insert(
                            id,
                            TeacherInfo {
                                name: name.join(" "),
                                external_id: external_id.to_string(),
                                department_external_id: department.to_string(),
                            },
                        );
                        session.current_teacher = id;
                        println!("Teacher {} selected.", name.join(" "));
                    }
                    _ => println!("Usage: teacher <external_id> <department_id> <name...>"),
                }
            }
            "add" => {
                let args: Vec<&str> = parts.collect();
                if args.len() < 9 {
                    println!("Usage: add <weekday> <les> <subg> <odd|even|both> <kind> <students> <building> <room> <discipline...>");
                    continue;
                }
                let weekday: Weekday = match args[0].parse() { Ok(v) => v, Err(_) => { println!("Invalid weekday"); continue; } };
                let lesson_number: i8 = match args[1].parse() { Ok(v) => v, Err(_) => { println!("Invalid lesson number"); continue; } };
                let subgroup: i8 = match args[2].parse() { Ok(v) => v, Err(_) => { println!("Invalid subgroup"); continue; } };
                let parity: WeekParity = match args[3].parse() { Ok(v) => v, Err(e) => { println!("{}", e); continue; } };
                let kind: LessonKind = match args[4].parse() { Ok(v) => v, Err(e) => { println!("{}", e); continue; } };
                let students_count: i16 = match args[5].parse() { Ok(v) => v, Err(_) => { println!("Invalid students count"); continue; } };
                let input = LessonInput {
                    discipline: args[8..].join(" "),
                    teacher_id: session.current_teacher,
                    students_count,
                    lesson_number,
                    subgroup,
                    lesson_kind: kind.code(),
                    cabinet: Cabinet::new(args[6], args[7]),
                };
                let Some(schedule) = session.schedule.as_mut() else {
                    println!("No schedule. Use 'new' first.");
                    continue;
                };
                let result = schedule
                    .as_cycled_mut()
                    .and_then(|cycled| cycled.add_item(weekday, parity.code(), input));
                match result {
                    Ok(_) => {
                        println!("Lesson added.");
                        print_schedule(&session);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "remove" => {
                let args: Vec<&str> = parts.collect();
                if args.len() != 4 {
                    println!("Usage: remove <weekday> <les> <subg> <odd|even|both>");
                    continue;
                }
                let weekday: Weekday = match args[0].parse() { Ok(v) => v, Err(_) => { println!("Invalid weekday"); continue; } };
                let lesson_number: i8 = match args[1].parse() { Ok(v) => v, Err(_) => { println!("Invalid lesson number"); continue; } };
                let subgroup: i8 = match args[2].parse() { Ok(v) => v, Err(_) => { println!("Invalid subgroup"); continue; } };
                let parity: WeekParity = match args[3].parse() { Ok(v) => v, Err(e) => { println!("{}", e); continue; } };
                let Some(schedule) = session.schedule.as_mut() else {
                    println!("No schedule. Use 'new' first.");
                    continue;
                };
                let result = schedule.as_cycled_mut().and_then(|cycled| {
                    cycled.remove_item(weekday, lesson_number, subgroup, parity.code())
                });
                match result {
                    Ok(removed) => println!("Removed '{}'.", removed.discipline),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "on" => {
                let date = parts.next().and_then(parse_date);
                let admission = parts.next().and_then(|s| s.parse::<i32>().ok());
                let (Some(date), Some(admission)) = (date, admission) else {
                    println!("Usage: on <YYYY-MM-DD> <admission_year>");
                    continue;
                };
                let Some(schedule) = session.schedule.as_ref() else {
                    println!("No schedule. Use 'new' first.");
                    continue;
                };
                let semester = i32::try_from(schedule.semester()).unwrap_or(i32::MAX);
                let projector = ScheduleProjector::new(&session.calendar);
                let result = session
                    .calendar
                    .education_start(admission, semester)
                    .and_then(|start| {
                        let cycled = schedule.as_cycled()?;
                        projector.items_on_date(cycled, start, date)
                    });
                match result {
                    Ok(items) => {
                        let refs: Vec<&ScheduleItem> = items.iter().collect();
                        println!("{} lessons on {}.", items.len(), date);
                        println!("{}", render_items_as_text_table(&session, &refs));
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "materialize" => {
                let Some(admission) = parts.next().and_then(|s| s.parse::<i32>().ok()) else {
                    println!("Usage: materialize <admission_year>");
                    continue;
                };
                let Some(schedule) = session.schedule.as_ref() else {
                    println!("No schedule. Use 'new' first.");
                    continue;
                };
                if schedule.kind() == ScheduleKind::Calendar {
                    println!("Schedule is already a calendar schedule.");
                    continue;
                }
                let semester = i32::try_from(schedule.semester()).unwrap_or(i32::MAX);
                let projector = ScheduleProjector::new(&session.calendar);
                let result = session
                    .calendar
                    .education_start(admission, semester)
                    .and_then(|start| projector.materialize_calendar(schedule, start));
                match result {
                    Ok(calendar) => {
                        println!(
                            "Materialized {} dated lessons into schedule {}.",
                            calendar.item_count(),
                            calendar.id()
                        );
                        session.schedule = Some(calendar);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "export" => {
                let (Some(path), Some(group_number)) = (parts.next(), parts.next()) else {
                    println!("Usage: export <path> <group_number>");
                    continue;
                };
                let Some(schedule) = session.schedule.as_ref() else {
                    println!("No schedule. Use 'new' first.");
                    continue;
                };
                let file = match File::create(path) {
                    Ok(f) => f,
                    Err(e) => { println!("Error writing {}: {}", path, e); continue; }
                };
                match export_csv(
                    schedule,
                    group_number,
                    &session.teachers,
                    file,
                    &ExportOptions::default(),
                ) {
                    Ok(rows) => println!("Exported {} rows to {}.", rows, path),
                    Err(e) => println!("Error exporting schedule: {}", e),
                }
            }
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path, session.schedule.as_ref()) {
                    (Some("json"), Some(_), None) => println!("No schedule. Use 'new' first."),
                    (Some("json"), Some(path), Some(schedule)) => {
                        match save_schedule_to_json(schedule, path) {
                            Ok(_) => println!("Schedule saved to {}.", path),
                            Err(e) => println!("Error saving schedule: {}", e),
                        }
                    }
                    _ => println!("Usage: save json <path>"),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => match load_schedule_from_json(path) {
                        Ok(loaded) => {
                            session.schedule = Some(loaded);
                            println!("Schedule loaded from {}.", path);
                            print_schedule(&session);
                        }
                        Err(e) => println!("Error loading schedule: {}", e),
                    },
                    _ => println!("Usage: load json <path>"),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
