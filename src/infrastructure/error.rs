use thiserror::Error;

/// Failure kinds for one brain-dump analysis attempt. Callers that want to
/// react differently can match on the kind; the default presentation is the
/// single generic message from [`AnalysisError::user_message`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("brain dump text must not be empty")]
    EmptyInput,
    #[error("network error while contacting the language service: {0}")]
    Network(String),
    #[error("language service response did not match the task schema: {0}")]
    SchemaMismatch(String),
    #[error("language service quota exhausted")]
    Quota,
    #[error("language service error: {0}")]
    Service(String),
}

impl AnalysisError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Please enter a description of your day.",
            _ => {
                "An error occurred while analyzing your day. \
                 Please check your API key and try again."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("couldn't determine a specific date for this task to add it to your calendar")]
    UnresolvedDueDate,
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}
