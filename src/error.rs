use thiserror::Error;

/// Measurement pipeline error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid measurement duration: {0} s")]
    InvalidDuration(f64),

    #[error("No measurement running")]
    NotRunning,

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Sample queue full")]
    QueueFull,

    #[error("Measurement worker disconnected")]
    Disconnected,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for measurement operations
pub type MResult<T> = Result<T, MeasurementError>;

impl MeasurementError {
    /// True for errors caused by caller-supplied configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MeasurementError::InvalidConfig(_)
                | MeasurementError::InvalidDuration(_)
                | MeasurementError::ConfigLoad(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MeasurementError::InvalidDuration(-1.0);
        assert_eq!(err.to_string(), "Invalid measurement duration: -1 s");
        assert_eq!(MeasurementError::NotRunning.to_string(), "No measurement running");
    }

    #[test]
    fn test_config_error_classification() {
        assert!(MeasurementError::InvalidConfig("x".to_string()).is_config_error());
        assert!(MeasurementError::InvalidDuration(0.0).is_config_error());
        assert!(!MeasurementError::NotRunning.is_config_error());
        assert!(!MeasurementError::QueueFull.is_config_error());
    }
}
