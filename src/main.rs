use brainweek::infrastructure::config::{read_notifications_enabled, read_reminder_delay_seconds};
use brainweek::infrastructure::credential_store::{resolve_api_key, KeyringCredentialStore};
use brainweek::infrastructure::gemini_client::ReqwestGeminiClient;
use brainweek::infrastructure::notifier::TerminalNotifier;
use brainweek::{
    analyze_day_impl, export_calendar_impl, list_tasks_impl, set_reminder_impl,
    toggle_complete_impl, week_view_impl, AppState, InfraError, Task, WeekViewResponse,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "brainweek",
    about = "Turns an end-of-day brain dump into a prioritized weekly plan",
    version
)]
struct Cli {
    /// Workspace directory holding config/, state/ and logs/. Defaults to
    /// the current directory.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the workspace layout and default config.
    Init,
    /// Analyze a brain dump and replace the task list with the result.
    Analyze {
        /// The brain dump text; omit to read it from stdin.
        text: Option<String>,
    },
    /// Show the weekly plan.
    Week {
        /// Weeks to shift relative to the current week.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
    /// List every task with its identifier.
    List,
    /// Toggle a task's completion state.
    Toggle { task_id: String },
    /// Arm a one-hour reminder for a task.
    Remind {
        task_id: String,
        /// Keep the process alive until the reminder fires.
        #[arg(long)]
        wait: bool,
    },
    /// Print a Google Calendar link for a task.
    Export { task_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let workspace_root = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };
    let state = AppState::new(workspace_root).map_err(|error| error.to_string())?;

    match cli.command {
        Command::Init => {
            println!("workspace ready");
            println!("  config:   {}", state.config_dir().display());
            println!("  database: {}", state.database_path().display());
            Ok(())
        }
        Command::Analyze { text } => {
            let user_input = match text {
                Some(text) => text,
                None => read_stdin()?,
            };

            let store = KeyringCredentialStore::default();
            let Some(api_key) = resolve_api_key(&store) else {
                return Err(
                    "missing Gemini API key: store one in the keyring or set \
                     BRAINWEEK_GEMINI_API_KEY"
                        .to_string(),
                );
            };

            let client = Arc::new(ReqwestGeminiClient::new(api_key));
            match analyze_day_impl(&state, client, user_input).await {
                Ok(tasks) => {
                    println!("captured {} tasks", tasks.len());
                    for task in &tasks {
                        println!("  {}", render_task_line(task));
                    }
                    Ok(())
                }
                Err(InfraError::Analysis(error)) => Err(error.user_message().to_string()),
                Err(error) => Err(state.command_error("analyze_day", &error)),
            }
        }
        Command::Week { offset } => {
            let view = week_view_impl(&state, offset)
                .map_err(|error| state.command_error("week_view", &error))?;
            render_week(&view);
            Ok(())
        }
        Command::List => {
            let tasks =
                list_tasks_impl(&state).map_err(|error| state.command_error("list_tasks", &error))?;
            if tasks.is_empty() {
                println!("no tasks yet; run `brainweek analyze` first");
            }
            for task in &tasks {
                println!("{}", render_task_line(task));
            }
            Ok(())
        }
        Command::Toggle { task_id } => {
            let updated = toggle_complete_impl(&state, task_id)
                .map_err(|error| state.command_error("toggle_complete", &error))?;
            println!("{}", render_task_line(&updated));
            Ok(())
        }
        Command::Remind { task_id, wait } => {
            let enabled = read_notifications_enabled(state.config_dir())
                .map_err(|error| state.command_error("set_reminder", &error))?;
            let notifier = Arc::new(TerminalNotifier::new(enabled));
            let response = set_reminder_impl(&state, notifier, task_id)
                .map_err(|error| state.command_error("set_reminder", &error))?;

            match response.status.as_str() {
                "scheduled" => {
                    let delay_seconds = read_reminder_delay_seconds(state.config_dir())
                        .map_err(|error| state.command_error("set_reminder", &error))?;
                    println!("reminder set; it fires in {delay_seconds}s");
                    if wait {
                        tokio::time::sleep(std::time::Duration::from_secs(delay_seconds + 1)).await;
                    }
                }
                "already_set" => println!("a reminder is already set for this task"),
                _ => {
                    if let Some(message) = response.message {
                        println!("{message}");
                    }
                }
            }
            Ok(())
        }
        Command::Export { task_id } => {
            let exported = export_calendar_impl(&state, task_id)
                .map_err(|error| state.command_error("export_calendar", &error))?;
            println!("{}", exported.url);
            Ok(())
        }
    }
}

fn read_stdin() -> Result<String, String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|error| error.to_string())?;
    Ok(buffer)
}

fn render_week(view: &WeekViewResponse) {
    println!("{}", view.range_label);
    for day in &view.days {
        let marker = if day.is_today { "*" } else { " " };
        println!("{marker} {} {}", day.weekday, day.date);
        if day.tasks.is_empty() {
            println!("      no tasks");
        } else {
            for task in &day.tasks {
                println!("      {}", render_task_line(task));
            }
        }
    }
    if !view.completed.is_empty() {
        println!("Completed");
        for task in &view.completed {
            println!("      {}", render_task_line(task));
        }
    }
}

fn render_task_line(task: &Task) -> String {
    let checkbox = if task.is_completed { "[x]" } else { "[ ]" };
    let reminder = if task.reminder_set {
        " (reminder set)"
    } else {
        ""
    };
    format!(
        "{checkbox} {} [{}] {} ({}) due: {}{reminder}",
        task.id,
        task.priority.label(),
        task.task_name,
        task.subject,
        task.due_date
    )
}
