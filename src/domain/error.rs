//! Domain error types.

/// Top-level error type for redblue.
#[derive(Debug, thiserror::Error)]
pub enum RedblueError {
    #[error("invalid {column} value {value:?} for {state} in {year}")]
    Parse {
        column: String,
        state: String,
        year: String,
        value: String,
    },

    #[error("{what} for {year} is not a finite number")]
    Overflow { year: String, what: String },

    #[error("year {year} has a numerator total but no denominator total")]
    KeyMismatch { year: String },

    #[error("missing data for year {year}: {reason}")]
    MissingYear { year: String, reason: String },

    #[error("{state} is classified both red and blue in {year}")]
    AffiliationOverlap { year: String, state: String },

    #[error("{file}: missing column {column:?}")]
    MissingColumn { file: String, column: String },

    #[error("{file}: {reason}")]
    Csv { file: String, reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RedblueError {
    /// Process exit status for this error. Never zero.
    pub fn exit_status(&self) -> u8 {
        match self {
            RedblueError::Io(_) => 1,
            RedblueError::ConfigParse { .. }
            | RedblueError::ConfigMissing { .. }
            | RedblueError::ConfigInvalid { .. } => 2,
            RedblueError::MissingColumn { .. } | RedblueError::Csv { .. } => 3,
            RedblueError::Parse { .. } | RedblueError::Overflow { .. } => 4,
            RedblueError::KeyMismatch { .. }
            | RedblueError::MissingYear { .. }
            | RedblueError::AffiliationOverlap { .. } => 5,
        }
    }
}

impl From<&RedblueError> for std::process::ExitCode {
    fn from(err: &RedblueError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
