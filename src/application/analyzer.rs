use crate::application::commands::next_id;
use crate::domain::models::{Priority, Task};
use crate::infrastructure::error::AnalysisError;
use crate::infrastructure::gemini_client::{GenerativeClient, RawTask};
use std::sync::Arc;

/// Turns one brain dump into a fresh batch of task records. The service
/// returns bare `{taskName, subject, dueDate, priority}` rows; identifiers
/// and state flags are attached locally so the service never controls them.
pub struct BrainDumpAnalyzer<C: GenerativeClient> {
    client: Arc<C>,
}

impl<C: GenerativeClient> BrainDumpAnalyzer<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, user_input: &str) -> Result<Vec<Task>, AnalysisError> {
        let trimmed = user_input.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let raw_tasks = self.client.generate_tasks(trimmed).await?;
        raw_tasks.into_iter().map(adopt_raw_task).collect()
    }
}

fn adopt_raw_task(raw: RawTask) -> Result<Task, AnalysisError> {
    let priority = Priority::from_wire(raw.priority).ok_or_else(|| {
        AnalysisError::SchemaMismatch(format!(
            "priority must be 1, 2 or 3, got {}",
            raw.priority
        ))
    })?;

    let task = Task {
        id: next_id("tsk"),
        task_name: raw.task_name,
        subject: raw.subject,
        due_date: raw.due_date,
        priority,
        is_completed: false,
        reminder_set: false,
    };
    task.validate().map_err(AnalysisError::SchemaMismatch)?;
    Ok(task)
}
