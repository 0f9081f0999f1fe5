//! Domain error types.

/// Top-level error type for sabia.
#[derive(Debug, thiserror::Error)]
pub enum SabiaError {
    #[error("data load error: {reason}")]
    DataLoad { reason: String },

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

    #[error("unknown metric '{name}'")]
    UnknownMetric { name: String },

    #[error("unknown dimension '{name}'")]
    UnknownDimension { name: String },

    #[error("invalid period '{value}'")]
    InvalidPeriod { value: String },

    #[error("insufficient history for {metric}: have {points} points, need {minimum}")]
    InsufficientHistory {
        metric: String,
        points: usize,
        minimum: usize,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SabiaError> for std::process::ExitCode {
    fn from(err: &SabiaError) -> Self {
        let code: u8 = match err {
            SabiaError::Io(_) | SabiaError::Report { .. } => 1,
            SabiaError::ConfigParse { .. }
            | SabiaError::ConfigMissing { .. }
            | SabiaError::ConfigInvalid { .. } => 2,
            SabiaError::DataLoad { .. } => 3,
            SabiaError::UnknownMetric { .. }
            | SabiaError::UnknownDimension { .. }
            | SabiaError::InvalidPeriod { .. } => 4,
            SabiaError::InsufficientHistory { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
