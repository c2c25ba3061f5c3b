//! Domain error types.

/// Top-level error type for condor.
#[derive(Debug, thiserror::Error)]
pub enum CondorError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("invariant violation at bar {index}: {reason}")]
    InvariantViolation { index: usize, reason: String },

    #[error("position state conflict: {reason}")]
    PositionConflict { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CondorError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        CondorError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&CondorError> for std::process::ExitCode {
    fn from(err: &CondorError) -> Self {
        let code: u8 = match err {
            CondorError::Io(_) => 1,
            CondorError::ConfigParse { .. }
            | CondorError::ConfigMissing { .. }
            | CondorError::ConfigInvalid { .. } => 2,
            CondorError::Data { .. } => 3,
            CondorError::InvariantViolation { .. } | CondorError::PositionConflict { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
