use crate::application::analyzer::BrainDumpAnalyzer;
use crate::application::bootstrap::bootstrap_workspace;
use crate::domain::dates::{format_week_range, is_same_day, resolve_due_date, week_days};
use crate::domain::models::Task;
use crate::infrastructure::calendar_link::build_event_url;
use crate::infrastructure::config::{
    read_reference_instant, read_reminder_delay_seconds, read_timezone,
};
use crate::infrastructure::error::{AnalysisError, InfraError};
use crate::infrastructure::gemini_client::GenerativeClient;
use crate::infrastructure::notifier::Notifier;
use crate::infrastructure::task_repository::{SqliteTaskRepository, TaskRepository};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const REMINDER_TITLE: &str = "Task Reminder";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

pub struct AppState {
    config_dir: PathBuf,
    database_path: PathBuf,
    logs_dir: PathBuf,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config_dir = workspace_root.join("config");
        let logs_dir = workspace_root.join("logs");

        let state = Self {
            config_dir,
            database_path: bootstrap.database_path,
            logs_dir,
            runtime: Mutex::new(RuntimeState::default()),
            log_guard: Mutex::new(()),
        };

        // Rehydrate the collection; a broken slot means starting over empty
        // rather than refusing to start.
        match SqliteTaskRepository::new(&state.database_path).load() {
            Ok(tasks) => {
                if let Ok(mut runtime) = state.runtime.lock() {
                    runtime.tasks = tasks;
                }
            }
            Err(error) => {
                state.log_error("startup", &format!("failed to load persisted tasks: {error}"));
            }
        }

        Ok(state)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// "Today" for every scheduling decision: the pinned reference date from
    /// config when present, wall-clock time otherwise, in the configured
    /// timezone.
    pub fn reference_instant(&self) -> Result<DateTime<Tz>, InfraError> {
        let timezone = read_timezone(&self.config_dir)?;
        let instant = match read_reference_instant(&self.config_dir)? {
            Some(pinned) => pinned,
            None => Utc::now(),
        };
        Ok(instant.with_timezone(&timezone))
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    // Best-effort overwrite of the durable slot; failures are logged and the
    // in-memory collection stays authoritative for this process.
    fn persist_tasks(&self, command: &str, tasks: &[Task]) {
        if let Err(error) = SqliteTaskRepository::new(&self.database_path).save(tasks) {
            self.log_error(command, &format!("failed to persist tasks: {error}"));
        }
    }
}

#[derive(Debug, Default)]
struct RuntimeState {
    tasks: Vec<Task>,
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime state lock poisoned: {error}")))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SetReminderResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarExportResponse {
    pub url: String,
    pub start: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayScheduleResponse {
    pub date: String,
    pub weekday: String,
    pub is_today: bool,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekViewResponse {
    pub range_label: String,
    pub days: Vec<DayScheduleResponse>,
    pub completed: Vec<Task>,
}

/// Runs one analysis over the brain dump and replaces the whole collection
/// with the result. The previous collection is cleared (and the cleared state
/// persisted) as soon as the attempt starts, so a failed attempt leaves an
/// empty collection behind.
pub async fn analyze_day_impl<C: GenerativeClient>(
    state: &AppState,
    client: Arc<C>,
    user_input: String,
) -> Result<Vec<Task>, InfraError> {
    if user_input.trim().is_empty() {
        return Err(InfraError::Analysis(AnalysisError::EmptyInput));
    }

    {
        let mut runtime = lock_runtime(state)?;
        runtime.tasks.clear();
    }
    state.persist_tasks("analyze_day", &[]);

    let analyzer = BrainDumpAnalyzer::new(client);
    let tasks = match analyzer.analyze(&user_input).await {
        Ok(tasks) => tasks,
        Err(error) => {
            state.log_error("analyze_day", &error.to_string());
            return Err(InfraError::Analysis(error));
        }
    };

    {
        let mut runtime = lock_runtime(state)?;
        runtime.tasks = tasks.clone();
    }
    state.persist_tasks("analyze_day", &tasks);
    state.log_info(
        "analyze_day",
        &format!("captured {} tasks from brain dump", tasks.len()),
    );
    Ok(tasks)
}

pub fn list_tasks_impl(state: &AppState) -> Result<Vec<Task>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.tasks.clone())
}

pub fn toggle_complete_impl(state: &AppState, task_id: String) -> Result<Task, InfraError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }

    let (updated, snapshot) = {
        let mut runtime = lock_runtime(state)?;
        let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
            return Err(InfraError::InvalidConfig(format!(
                "task not found: {task_id}"
            )));
        };
        task.is_completed = !task.is_completed;
        let updated = task.clone();
        (updated, runtime.tasks.clone())
    };

    state.persist_tasks("toggle_complete", &snapshot);
    state.log_info(
        "toggle_complete",
        &format!("task_id={task_id} is_completed={}", updated.is_completed),
    );
    Ok(updated)
}

/// Arms a one-shot reminder for the task. Setting is monotonic: once armed
/// the flag never goes back, and repeated calls are a quiet no-op. A denied
/// permission grant leaves the flag unset.
pub fn set_reminder_impl(
    state: &AppState,
    notifier: Arc<dyn Notifier>,
    task_id: String,
) -> Result<SetReminderResponse, InfraError> {
    let task_id = task_id.trim().to_string();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }

    let task = {
        let runtime = lock_runtime(state)?;
        runtime
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    };
    let Some(task) = task else {
        return Err(InfraError::InvalidConfig(format!(
            "task not found: {task_id}"
        )));
    };

    if task.reminder_set {
        return Ok(SetReminderResponse {
            status: "already_set".to_string(),
            message: None,
        });
    }

    if !notifier.request_permission()? {
        state.log_info(
            "set_reminder",
            &format!("notification permission denied for task_id={task_id}"),
        );
        return Ok(SetReminderResponse {
            status: "permission_denied".to_string(),
            message: Some(
                "Notification permission denied. We can't send you reminders.".to_string(),
            ),
        });
    }

    let delay_seconds = read_reminder_delay_seconds(&state.config_dir)?;
    schedule_reminder(
        notifier,
        task.task_name.clone(),
        std::time::Duration::from_secs(delay_seconds),
    );

    let snapshot = {
        let mut runtime = lock_runtime(state)?;
        if let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) {
            task.reminder_set = true;
        }
        runtime.tasks.clone()
    };
    state.persist_tasks("set_reminder", &snapshot);
    state.log_info(
        "set_reminder",
        &format!("scheduled reminder for task_id={task_id} in {delay_seconds}s"),
    );
    Ok(SetReminderResponse {
        status: "scheduled".to_string(),
        message: None,
    })
}

// Fire-and-forget: the timer lives only as long as this process and is never
// re-armed after a restart. Delivery failures are deliberately swallowed.
fn schedule_reminder(notifier: Arc<dyn Notifier>, task_name: String, delay: std::time::Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = notifier.notify(REMINDER_TITLE, &task_name);
    });
}

pub fn export_calendar_impl(
    state: &AppState,
    task_id: String,
) -> Result<CalendarExportResponse, InfraError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }

    let task = {
        let runtime = lock_runtime(state)?;
        runtime
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    };
    let Some(task) = task else {
        return Err(InfraError::InvalidConfig(format!(
            "task not found: {task_id}"
        )));
    };

    let reference = state.reference_instant()?;
    let Some(start) = resolve_due_date(&task.due_date, reference) else {
        state.log_info(
            "export_calendar",
            &format!("unresolved due date for task_id={task_id}"),
        );
        return Err(InfraError::UnresolvedDueDate);
    };

    let url = build_event_url(&task, start)?;
    state.log_info(
        "export_calendar",
        &format!("built calendar link for task_id={task_id}"),
    );
    Ok(CalendarExportResponse {
        url: url.to_string(),
        start: start.to_rfc3339(),
    })
}

/// Lays the active tasks out on the week containing the reference instant
/// shifted by `week_offset` weeks. Tasks whose due-date phrase cannot be
/// resolved, or resolves outside the week, are left off the grid; completed
/// tasks come back as a flat list regardless of due date.
pub fn week_view_impl(state: &AppState, week_offset: i64) -> Result<WeekViewResponse, InfraError> {
    let reference = state.reference_instant()?;
    let today = reference.date_naive();
    let anchor = today + Duration::days(7 * week_offset);

    let tasks = {
        let runtime = lock_runtime(state)?;
        runtime.tasks.clone()
    };
    let (completed, active): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(|task| task.is_completed);

    let days = week_days(anchor)
        .into_iter()
        .map(|day| DayScheduleResponse {
            date: day.to_string(),
            weekday: day.format("%a").to_string(),
            is_today: day == today,
            tasks: active
                .iter()
                .filter(|task| {
                    resolve_due_date(&task.due_date, reference)
                        .map(|due| is_same_day(due, day))
                        .unwrap_or(false)
                })
                .cloned()
                .collect(),
        })
        .collect();

    Ok(WeekViewResponse {
        range_label: format_week_range(anchor),
        days,
        completed,
    })
}
