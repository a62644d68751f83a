//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or did not match the settings shape.
    #[error("failed to load settings: {0}")]
    Load(Box<figment::Error>),
    /// A settings value was out of range.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("send_queue must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid settings value: send_queue must be at least 1"
        );
    }

    #[test]
    fn figment_error_converts() {
        let err: SettingsError = figment::Error::from("boom".to_string()).into();
        assert!(matches!(err, SettingsError::Load(_)));
        assert!(err.to_string().contains("boom"));
    }
}
