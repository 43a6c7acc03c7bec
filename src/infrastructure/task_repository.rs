use crate::domain::models::Task;
use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const TASKS_SLOT: &str = "tasks";

/// Durable slot holding the whole task collection. Every save overwrites the
/// previous payload; there is no per-task persistence.
pub trait TaskRepository: Send + Sync {
    fn load(&self) -> Result<Vec<Task>, InfraError>;
    fn save(&self, tasks: &[Task]) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    db_path: PathBuf,
}

impl SqliteTaskRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn load(&self) -> Result<Vec<Task>, InfraError> {
        let connection = self.connect()?;
        let payload: Option<String> = connection
            .query_row(
                "SELECT payload FROM slots WHERE name = ?1",
                params![TASKS_SLOT],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            return Ok(Vec::new());
        };

        // A corrupt payload must not break startup; the collection simply
        // starts over empty.
        Ok(serde_json::from_str(&payload).unwrap_or_default())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), InfraError> {
        let payload = serde_json::to_string(tasks)?;
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO slots (name, payload, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
               payload = excluded.payload,
               updated_at = excluded.updated_at",
            params![TASKS_SLOT, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

impl TaskRepository for InMemoryTaskRepository {
    fn load(&self) -> Result<Vec<Task>, InfraError> {
        let tasks = self.tasks.lock().map_err(|error| {
            InfraError::InvalidConfig(format!("task repository lock poisoned: {error}"))
        })?;
        Ok(tasks.clone())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), InfraError> {
        let mut guard = self.tasks.lock().map_err(|error| {
            InfraError::InvalidConfig(format!("task repository lock poisoned: {error}"))
        })?;
        *guard = tasks.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Priority;
    use crate::infrastructure::storage::initialize_database;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DB: AtomicUsize = AtomicUsize::new(0);

    struct TempDatabase {
        dir: PathBuf,
        path: PathBuf,
    }

    impl TempDatabase {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DB.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!(
                "brainweek-repo-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&dir).expect("create temp dir");
            let path = dir.join("brainweek.sqlite");
            initialize_database(&path).expect("initialize database");
            Self { dir, path }
        }
    }

    impl Drop for TempDatabase {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task {
                id: "tsk-1".to_string(),
                task_name: "Pre-read Chapter 5".to_string(),
                subject: "History".to_string(),
                due_date: "Tomorrow, Aug 28".to_string(),
                priority: Priority::High,
                is_completed: false,
                reminder_set: false,
            },
            Task {
                id: "tsk-2".to_string(),
                task_name: "Finish problem set".to_string(),
                subject: "Math".to_string(),
                due_date: "Friday, Aug 29".to_string(),
                priority: Priority::Medium,
                is_completed: true,
                reminder_set: true,
            },
        ]
    }

    #[test]
    fn save_then_load_roundtrips_the_collection() {
        let db = TempDatabase::new();
        let repository = SqliteTaskRepository::new(&db.path);

        let tasks = sample_tasks();
        repository.save(&tasks).expect("save tasks");
        assert_eq!(repository.load().expect("load tasks"), tasks);
    }

    #[test]
    fn save_overwrites_previous_collection() {
        let db = TempDatabase::new();
        let repository = SqliteTaskRepository::new(&db.path);

        repository.save(&sample_tasks()).expect("save tasks");
        repository.save(&[]).expect("save empty");
        assert!(repository.load().expect("load tasks").is_empty());
    }

    #[test]
    fn empty_slot_loads_as_empty_collection() {
        let db = TempDatabase::new();
        let repository = SqliteTaskRepository::new(&db.path);
        assert!(repository.load().expect("load tasks").is_empty());
    }

    #[test]
    fn malformed_payload_loads_as_empty_collection() {
        let db = TempDatabase::new();
        let connection = Connection::open(&db.path).expect("open db");
        connection
            .execute(
                "INSERT INTO slots (name, payload, updated_at) VALUES (?1, ?2, ?3)",
                params![TASKS_SLOT, "{not valid json", Utc::now().to_rfc3339()],
            )
            .expect("insert malformed payload");

        let repository = SqliteTaskRepository::new(&db.path);
        assert!(repository.load().expect("load tasks").is_empty());
    }

    #[test]
    fn in_memory_repository_roundtrips() {
        let repository = InMemoryTaskRepository::default();
        let tasks = sample_tasks();
        repository.save(&tasks).expect("save tasks");
        assert_eq!(repository.load().expect("load tasks"), tasks);
    }
}
