//! Domain error types.
//!
//! Parsing free text never produces an error; everything here comes from
//! configuration, data loading, or query execution.

/// Top-level error type for quant-nlq.
#[derive(Debug, thiserror::Error)]
pub enum NlqError {
    #[error("indicator data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

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

    #[error("import error in {file}: {reason}")]
    Import { file: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NlqError {
    pub fn data_unavailable(reason: impl ToString) -> Self {
        NlqError::DataUnavailable {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        NlqError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&NlqError> for std::process::ExitCode {
    fn from(err: &NlqError) -> Self {
        let code: u8 = match err {
            NlqError::Io(_) => 1,
            NlqError::ConfigParse { .. }
            | NlqError::ConfigMissing { .. }
            | NlqError::ConfigInvalid { .. } => 2,
            NlqError::DataUnavailable { .. } => 3,
            NlqError::InvalidParameter { .. } => 4,
            NlqError::Import { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_data_unavailable() {
        let err = NlqError::data_unavailable("connection refused");
        assert_eq!(
            err.to_string(),
            "indicator data unavailable: connection refused"
        );
    }

    #[test]
    fn display_invalid_parameter() {
        let err = NlqError::invalid_parameter("limit", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter limit: must be positive, got 0"
        );
    }

    #[test]
    fn display_config_invalid() {
        let err = NlqError::ConfigInvalid {
            section: "interpreter".into(),
            key: "crossover_lookback".into(),
            reason: "must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [interpreter] crossover_lookback: must be at least 1"
        );
    }

    #[test]
    fn io_converts_transparently() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NlqError = io.into();
        assert!(matches!(err, NlqError::Io(_)));
        assert_eq!(err.to_string(), "gone");
    }
}
