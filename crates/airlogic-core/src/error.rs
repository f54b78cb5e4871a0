//! Error types for the airlogic core.

use thiserror::Error;

/// Airlogic result type.
pub type Result<T> = std::result::Result<T, AirlogicError>;

/// Errors that can surface from the automation core.
///
/// Data-unavailable and undefined-model-output conditions are deliberately
/// not represented here: they degrade to documented fallbacks (skip the
/// zone this cycle, assumed humidity, fallback setpoint, Indeterminate
/// ventilation) instead of propagating as errors.
#[derive(Error, Debug)]
pub enum AirlogicError {
    /// Sensor data provider failed
    #[error("Sensor data provider error: {0}")]
    Provider(String),

    /// Command publish failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// A bounded I/O operation timed out
    #[error("Timed out during {0}")]
    Timeout(&'static str),

    /// A feedback event referenced a zone that is not configured
    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    /// Feedback payload missing required fields or unparseable
    #[error("Invalid feedback payload: {0}")]
    InvalidFeedback(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
