use thiserror::Error;

/// Errors surfaced at the edges of the monitor.
///
/// Store transitions themselves are total and never fail.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Monitor has been disposed")]
    Disposed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Signal source error: {0}")]
    Source(String),
}

impl From<figment::Error> for MonitorError {
    fn from(error: figment::Error) -> Self {
        MonitorError::Config(Box::new(error))
    }
}

impl From<validator::ValidationErrors> for MonitorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MonitorError::InvalidConfig(errors.to_string())
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
