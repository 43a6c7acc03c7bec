pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::analyzer::BrainDumpAnalyzer;
pub use application::bootstrap::{bootstrap_workspace, BootstrapResult};
pub use application::commands::{
    analyze_day_impl, export_calendar_impl, list_tasks_impl, set_reminder_impl,
    toggle_complete_impl, week_view_impl, AppState, CalendarExportResponse, DayScheduleResponse,
    SetReminderResponse, WeekViewResponse,
};
pub use domain::dates::{format_week_range, is_same_day, resolve_due_date, start_of_week, week_days};
pub use domain::models::{Priority, Task};
pub use infrastructure::error::{AnalysisError, InfraError};
