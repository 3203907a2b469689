//! Domain error types.

/// Top-level error type for alphatrader.
#[derive(Debug, thiserror::Error)]
pub enum AlphatraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error("insufficient data for {code} on {exchange}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        exchange: String,
        bars: usize,
        minimum: usize,
    },

    #[error("empty universe: {reason}")]
    EmptyUniverse { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AlphatraderError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        AlphatraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        AlphatraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// Process exit status reported by the CLI for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            AlphatraderError::Io(_) => 1,
            AlphatraderError::ConfigParse { .. }
            | AlphatraderError::ConfigMissing { .. }
            | AlphatraderError::ConfigInvalid { .. } => 2,
            AlphatraderError::Data { .. } => 3,
            AlphatraderError::NoData { .. }
            | AlphatraderError::InsufficientData { .. }
            | AlphatraderError::EmptyUniverse { .. } => 5,
        }
    }
}

impl From<&AlphatraderError> for std::process::ExitCode {
    fn from(err: &AlphatraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
