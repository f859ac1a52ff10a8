use super::{PersistenceResult, ScheduleSnapshot};
use crate::Schedule;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = ScheduleSnapshot::from_schedule(schedule);
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush()?;
    log::debug!(
        "saved schedule {} ({} items) to {}",
        snapshot.id,
        snapshot.items.len(),
        path.as_ref().display()
    );
    Ok(())
}

pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let snapshot: ScheduleSnapshot = serde_json::from_reader(reader)?;
    let id = snapshot.id;
    snapshot.into_schedule().inspect_err(|err| {
        log::warn!(
            "rejected schedule {id} from {}: {err}",
            path.as_ref().display()
        );
    })
}
