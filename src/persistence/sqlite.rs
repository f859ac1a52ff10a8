use super::{PersistenceError, PersistenceResult, ScheduleSnapshot, ScheduleStore};
use crate::Schedule;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub struct SqliteScheduleStore {
    connection: Mutex<Connection>,
}

impl SqliteScheduleStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                semester INTEGER NOT NULL,
                kind TEXT NOT NULL,
                snapshot_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS schedules_group_idx ON schedules (group_id);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    fn decode(json: &str) -> PersistenceResult<Schedule> {
        let snapshot: ScheduleSnapshot = serde_json::from_str(json)?;
        let id = snapshot.id;
        snapshot.into_schedule().inspect_err(|err| {
            log::warn!("rejected stored schedule {id}: {err}");
        })
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let snapshot = ScheduleSnapshot::from_schedule(schedule);
        let json = serde_json::to_string(&snapshot)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM schedules WHERE id = ?1",
            params![snapshot.id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO schedules (id, group_id, semester, kind, snapshot_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.id.to_string(),
                snapshot.group_id.to_string(),
                snapshot.semester,
                snapshot.kind.as_str(),
                json
            ],
        )?;
        tx.commit()?;

        log::debug!(
            "stored {} schedule {} with {} items",
            snapshot.kind,
            snapshot.id,
            snapshot.items.len()
        );
        Ok(())
    }

    fn load_schedule(&self, id: Uuid) -> PersistenceResult<Option<Schedule>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT snapshot_json FROM schedules WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        json.as_deref().map(Self::decode).transpose()
    }

    fn list_schedules(&self) -> PersistenceResult<Vec<Schedule>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT snapshot_json FROM schedules ORDER BY group_id ASC, semester ASC, id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut schedules = Vec::new();
        for json in rows {
            schedules.push(Self::decode(&json?)?);
        }
        Ok(schedules)
    }

    fn delete_schedule(&self, id: Uuid) -> PersistenceResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM schedules WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}
