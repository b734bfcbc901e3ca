//! Domain error types.

/// Top-level error type for the copilot engine.
#[derive(Debug, thiserror::Error)]
pub enum CopilotError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CopilotError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        CopilotError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<&CopilotError> for std::process::ExitCode {
    fn from(err: &CopilotError) -> Self {
        let code: u8 = match err {
            CopilotError::Io(_) => 1,
            CopilotError::ConfigParse { .. }
            | CopilotError::ConfigMissing { .. }
            | CopilotError::ConfigInvalid { .. } => 2,
            CopilotError::InvalidArgument { .. } => 3,
            CopilotError::Data { .. } => 4,
            CopilotError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
