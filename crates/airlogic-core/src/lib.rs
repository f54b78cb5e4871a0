//! Shared types and collaborator seams for the airlogic HVAC automation core.
//!
//! This crate holds everything the decision crates agree on: reading and
//! command types, the configuration surface, the external-collaborator
//! traits (`SensorDataProvider`, `CommandPublisher`), the error taxonomy,
//! and the time-series resampling helpers used by the zone controllers.

pub mod config;
pub mod error;
pub mod provider;
pub mod series;
pub mod types;

pub use config::{AutomationConfig, ComfortParams, EngineConfig, ZoneDevices};
pub use error::{AirlogicError, Result};
pub use provider::{CommandPublisher, PublishHeaders, SensorDataProvider, TimeWindow};
pub use types::{
    CommandIntent, CommandMode, DeviceId, FcuCommandPayload, FeedbackCategory,
    OauCommandPayload, Reading, VentilationState, ZoneName,
};
