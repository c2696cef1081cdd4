pub mod coach;
pub mod integration;
pub mod messages;
pub mod motion;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CoachError {
    #[error("Chat gateway error: {0}")]
    Gateway(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Motion permission error: {0}")]
    Permission(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CoachError {
    fn from(e: std::io::Error) -> Self {
        CoachError::IOError(e.to_string())
    }
}

impl CoachError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A single dispatch is dropped, sensing continues
            CoachError::Gateway(_) => true,
            CoachError::InvalidRequest(_) => true,
            CoachError::Speech(_) => true,
            // Falls back to disabled-motion mode
            CoachError::Permission(_) => true,
            // Deployment errors
            CoachError::Config(_) => false,
            CoachError::Channel(_) => false,
            CoachError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            CoachError::Gateway(_) => {
                "Failed to communicate with AI service. Please try again.".to_string()
            }
            CoachError::InvalidRequest(_) => "Message cannot be empty.".to_string(),
            CoachError::Speech(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            CoachError::Permission(_) => {
                "Motion permission denied. Motion coaching is disabled.".to_string()
            }
            CoachError::Config(_) => "Configuration error. Please check settings.".to_string(),
            CoachError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            CoachError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(CoachError::Gateway("boom".into()).is_recoverable());
        assert!(CoachError::Permission("denied".into()).is_recoverable());
        assert!(!CoachError::Config("missing key".into()).is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let err: CoachError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, CoachError::IOError(_)));
        assert_eq!(err.user_message(), "File system error occurred.");
    }
}
