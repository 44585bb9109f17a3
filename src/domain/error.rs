//! Domain error types.

/// Top-level error type for argoth.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{collaborator} unavailable: {reason}")]
    ExternalUnavailable {
        collaborator: &'static str,
        reason: String,
    },

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

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TraderError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn unavailable(collaborator: &'static str, reason: impl Into<String>) -> Self {
        TraderError::ExternalUnavailable {
            collaborator,
            reason: reason.into(),
        }
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::ExternalUnavailable { .. } => 3,
            TraderError::UnknownStrategy { .. } => 4,
            TraderError::InsufficientData { .. } => 5,
            TraderError::InvalidInput { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = TraderError::InsufficientData {
            bars: 150,
            minimum: 201,
        };
        assert_eq!(err.to_string(), "insufficient data: have 150 bars, need 201");
    }

    #[test]
    fn unavailable_names_collaborator() {
        let err = TraderError::unavailable("price source", "terminal not connected");
        assert_eq!(
            err.to_string(),
            "price source unavailable: terminal not connected"
        );
    }

    #[test]
    fn config_invalid_message() {
        let err = TraderError::ConfigInvalid {
            section: "risk".into(),
            key: "max_drawdown".into(),
            reason: "must be between 0 and 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [risk] max_drawdown: must be between 0 and 1"
        );
    }
}
