use serde::{Deserialize, Serialize};

/// Urgency of a task as assigned by the analyzer. The wire protocol with the
/// language service uses the integers 1 (high) through 3 (low).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::High),
            2 => Some(Self::Medium),
            3 => Some(Self::Low),
            _ => None,
        }
    }

    pub fn wire_value(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// One actionable item extracted from a brain dump. `due_date` stays a
/// free-form phrase; resolution to an instant happens on demand and is never
/// written back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub task_name: String,
    pub subject: String,
    pub due_date: String,
    pub priority: Priority,
    pub is_completed: bool,
    #[serde(default)]
    pub reminder_set: bool,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.task_name, "task.task_name")?;
        Ok(())
    }

    /// Reminders are offered for high-priority tasks that are still open.
    pub fn reminder_eligible(&self) -> bool {
        self.priority == Priority::High && !self.is_completed
    }

    /// Calendar export is offered while the task is still open.
    pub fn calendar_eligible(&self) -> bool {
        !self.is_completed
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_task() -> Task {
        Task {
            id: "tsk-1".to_string(),
            task_name: "Review today's lesson on photosynthesis".to_string(),
            subject: "Biology".to_string(),
            due_date: "Tonight, Aug 27".to_string(),
            priority: Priority::High,
            is_completed: false,
            reminder_set: false,
        }
    }

    #[test]
    fn task_validate_accepts_valid_task() {
        assert!(sample_task().validate().is_ok());
    }

    #[test]
    fn task_validate_rejects_blank_name() {
        let mut task = sample_task();
        task.task_name = "   ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn priority_wire_mapping_covers_all_levels() {
        assert_eq!(Priority::from_wire(1), Some(Priority::High));
        assert_eq!(Priority::from_wire(2), Some(Priority::Medium));
        assert_eq!(Priority::from_wire(3), Some(Priority::Low));
        assert_eq!(Priority::from_wire(0), None);
        assert_eq!(Priority::from_wire(4), None);
    }

    #[test]
    fn priority_orders_high_before_low() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Medium];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::Medium, Priority::Low]
        );
    }

    #[test]
    fn reminder_eligibility_requires_high_priority_and_open_task() {
        let mut task = sample_task();
        assert!(task.reminder_eligible());

        task.is_completed = true;
        assert!(!task.reminder_eligible());
        assert!(!task.calendar_eligible());

        task.is_completed = false;
        task.priority = Priority::Medium;
        assert!(!task.reminder_eligible());
        assert!(task.calendar_eligible());
    }

    #[test]
    fn task_serde_roundtrip_preserves_all_fields() {
        let task = sample_task();
        let roundtrip: Task =
            serde_json::from_str(&serde_json::to_string(&task).expect("serialize task"))
                .expect("deserialize task");
        assert_eq!(roundtrip, task);
    }

    #[test]
    fn task_deserialize_defaults_missing_reminder_flag() {
        let payload = r#"{
            "id": "tsk-2",
            "task_name": "Outline history essay",
            "subject": "History",
            "due_date": "Friday, Aug 29",
            "priority": "medium",
            "is_completed": false
        }"#;
        let task: Task = serde_json::from_str(payload).expect("deserialize task");
        assert!(!task.reminder_set);
    }

    proptest! {
        #[test]
        fn priority_wire_roundtrip(value in 1u8..=3u8) {
            let priority = Priority::from_wire(value).expect("valid wire value");
            prop_assert_eq!(priority.wire_value(), value);
        }
    }
}
