use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(calagent::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calagent::config))]
    Config(String),

    #[error("Gemini API error: {0}")]
    #[diagnostic(code(calagent::gemini))]
    Gemini(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calagent::google_calendar))]
    GoogleCalendar(String),

    #[error("Unknown function: {0}")]
    #[diagnostic(code(calagent::unknown_function))]
    UnknownFunction(String),

    #[error("Invalid arguments for {function}: {message}")]
    #[diagnostic(code(calagent::invalid_arguments))]
    InvalidArguments { function: String, message: String },

    #[error("Prompt error: {0}")]
    #[diagnostic(code(calagent::prompt))]
    Prompt(String),

    #[error(transparent)]
    #[diagnostic(code(calagent::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calagent::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calagent::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<inquire::InquireError> for Error {
    fn from(err: inquire::InquireError) -> Self {
        Error::Prompt(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AgentResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
#[allow(dead_code)]
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Gemini errors
pub fn gemini_error(message: &str) -> Error {
    Error::Gemini(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create invalid-argument errors
pub fn invalid_arguments(function: &str, message: &str) -> Error {
    Error::InvalidArguments {
        function: function.to_string(),
        message: message.to_string(),
    }
}
