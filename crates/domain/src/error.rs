use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid topic segment for {field}: {value:?}")]
    InvalidTopicSegment { field: &'static str, value: String },

    #[error("No serial port found")]
    PortNotFound,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Publish error: {0}")]
    PublishError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
