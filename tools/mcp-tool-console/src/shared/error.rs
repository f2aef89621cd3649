use thiserror::Error;

/// Failures surfaced by the console client and the detail view.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Non-zero envelope code. Displays the server message only, which is what
    /// the user is shown.
    #[error("{message}")]
    Application { code: i64, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response envelope carried no data")]
    MissingData,
    #[error("argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("no tool server loaded")]
    NotLoaded,
    #[error("no tool at index {0}")]
    UnknownTool(usize),
    #[error("tool '{0}' cannot run: required arguments are empty or testing is disabled")]
    RunDisabled(String),
    #[error("tool '{0}' is already running")]
    RunInFlight(String),
    #[error("tool server '{0}' is still loading")]
    SelectionPending(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Application { .. } => "application",
            Self::Decode(_) => "decode",
            Self::MissingData => "missing_data",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::NotLoaded => "not_loaded",
            Self::UnknownTool(_) => "unknown_tool",
            Self::RunDisabled(_) => "run_disabled",
            Self::RunInFlight(_) => "run_in_flight",
            Self::SelectionPending(_) => "selection_pending",
            Self::Config(_) => "config",
        }
    }
}
