//! Core data structures for zone evaluation and command emission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Device identifier.
pub type DeviceId = String;

/// Thermal zone name.
pub type ZoneName = String;

/// A single telemetry reading from one device.
///
/// Supplied by the external data provider as a time-ordered sequence per
/// device. Metric values may be numeric (co2, humidity, temperature,
/// set_temperature) or strings (FCU mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Source device ID
    pub device_id: DeviceId,
    /// Sample timestamp
    pub timestamp: DateTime<Utc>,
    /// Metric name to value map
    pub metrics: HashMap<String, Value>,
}

impl Reading {
    /// Create a reading with no metrics.
    pub fn new(device_id: impl Into<DeviceId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            metrics: HashMap::new(),
        }
    }

    /// Attach a metric value.
    pub fn with_metric(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }

    /// Get a metric as f64, if present and numeric.
    pub fn metric_f64(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(Value::as_f64)
    }

    /// Get a metric as a string slice, if present and textual.
    pub fn metric_str(&self, name: &str) -> Option<&str> {
        self.metrics.get(name).and_then(Value::as_str)
    }
}

/// Command mode for FCU and OAU devices.
///
/// FCU commands use Cool/Fan/Dry (with an optional setpoint); OAU commands
/// use On/Off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandMode {
    /// FCU cooling at a target setpoint
    Cool,
    /// FCU fan only
    Fan,
    /// FCU dehumidify
    Dry,
    /// OAU running
    On,
    /// OAU stopped
    Off,
}

impl CommandMode {
    /// FCU wire encoding (1 = cool, 3 = fan, 5 = dry).
    pub fn fcu_code(&self) -> Option<u8> {
        match self {
            CommandMode::Cool => Some(1),
            CommandMode::Fan => Some(3),
            CommandMode::Dry => Some(5),
            CommandMode::On | CommandMode::Off => None,
        }
    }

    /// OAU wire encoding ("on" / "off").
    pub fn oau_mode(&self) -> Option<&'static str> {
        match self {
            CommandMode::On => Some("on"),
            CommandMode::Off => Some("off"),
            _ => None,
        }
    }

    /// Get the mode type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            CommandMode::Cool => "cool",
            CommandMode::Fan => "fan",
            CommandMode::Dry => "dry",
            CommandMode::On => "on",
            CommandMode::Off => "off",
        }
    }
}

impl std::fmt::Display for CommandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A command to be sent to one device.
///
/// Constructed fresh each evaluation; never mutated after construction
/// except for the uniform setpoint post-processing (floor, feedback offset,
/// jitter) applied to a whole batch before publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandIntent {
    /// Target device ID
    pub device_id: DeviceId,
    /// Command mode
    pub mode: CommandMode,
    /// Target setpoint temperature, for Cool commands
    pub setpoint: Option<f64>,
    /// Decision timestamp
    pub timestamp: DateTime<Utc>,
}

impl CommandIntent {
    /// Create an intent without a setpoint (fan, dry, on, off).
    pub fn new(device_id: impl Into<DeviceId>, mode: CommandMode, timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            mode,
            setpoint: None,
            timestamp,
        }
    }

    /// Create a cool intent at a setpoint.
    pub fn cool(
        device_id: impl Into<DeviceId>,
        setpoint: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            mode: CommandMode::Cool,
            setpoint: Some(setpoint),
            timestamp,
        }
    }
}

/// Ventilation state of a zone's outdoor-air units.
///
/// `Indeterminate` is the initial value and the hysteresis-band result. It
/// is not "off": an Indeterminate evaluation emits no command and leaves
/// whatever the last real command was holding downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VentilationState {
    /// OAU commanded on
    On,
    /// OAU commanded off
    Off,
    /// No transition condition fired; nothing published
    #[default]
    Indeterminate,
}

impl VentilationState {
    /// Whether this state corresponds to a publishable command.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, VentilationState::Indeterminate)
    }

    /// The command mode for this state, if actionable.
    pub fn command_mode(&self) -> Option<CommandMode> {
        match self {
            VentilationState::On => Some(CommandMode::On),
            VentilationState::Off => Some(CommandMode::Off),
            VentilationState::Indeterminate => None,
        }
    }
}

/// Tenant feedback category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FeedbackCategory {
    /// Tenant reports the zone is too hot
    #[serde(rename = "Too Hot")]
    TooHot,
    /// Tenant reports the zone is too cold
    #[serde(rename = "Too Cold")]
    TooCold,
}

impl FeedbackCategory {
    /// Parse the wire label used by the feedback source.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Too Hot" => Some(FeedbackCategory::TooHot),
            "Too Cold" => Some(FeedbackCategory::TooCold),
            _ => None,
        }
    }
}

/// FCU command payload as published to the downstream gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcuCommandPayload {
    /// Target setpoint, absent for fan/dry commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_temperature: Option<f64>,
    /// Wire mode (1 = cool, 3 = fan, 5 = dry)
    pub mode: u8,
    /// ISO-8601 timestamp
    pub timestamp: String,
    /// Unix timestamp with fractional seconds
    pub unix_timestamp: f64,
    /// Command origin marker
    pub source: String,
}

impl FcuCommandPayload {
    /// Build the payload for a FCU intent. Returns `None` for OAU modes.
    pub fn from_intent(intent: &CommandIntent) -> Option<Self> {
        let mode = intent.mode.fcu_code()?;
        Some(Self {
            set_temperature: intent.setpoint,
            mode,
            timestamp: intent.timestamp.to_rfc3339(),
            unix_timestamp: intent.timestamp.timestamp_micros() as f64 / 1_000_000.0,
            source: "automation".to_string(),
        })
    }
}

/// OAU command payload as published to the downstream gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauCommandPayload {
    /// "on" or "off"
    pub mode: String,
    /// Always 0; single-subdevice units
    pub subdevice_idx: u8,
}

impl OauCommandPayload {
    /// Build the payload for an OAU intent. Returns `None` for FCU modes.
    pub fn from_intent(intent: &CommandIntent) -> Option<Self> {
        let mode = intent.mode.oau_mode()?;
        Some(Self {
            mode: mode.to_string(),
            subdevice_idx: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_codes() {
        assert_eq!(CommandMode::Cool.fcu_code(), Some(1));
        assert_eq!(CommandMode::Fan.fcu_code(), Some(3));
        assert_eq!(CommandMode::Dry.fcu_code(), Some(5));
        assert_eq!(CommandMode::On.fcu_code(), None);
        assert_eq!(CommandMode::On.oau_mode(), Some("on"));
        assert_eq!(CommandMode::Off.oau_mode(), Some("off"));
        assert_eq!(CommandMode::Cool.oau_mode(), None);
    }

    #[test]
    fn test_ventilation_default_is_indeterminate() {
        let state = VentilationState::default();
        assert_eq!(state, VentilationState::Indeterminate);
        assert!(!state.is_actionable());
        assert_eq!(state.command_mode(), None);
        assert_eq!(VentilationState::On.command_mode(), Some(CommandMode::On));
    }

    #[test]
    fn test_reading_metric_access() {
        let reading = Reading::new("iaq-1", Utc::now())
            .with_metric("co2", 850.0)
            .with_metric("mode", "cool");

        assert_eq!(reading.metric_f64("co2"), Some(850.0));
        assert_eq!(reading.metric_str("mode"), Some("cool"));
        assert_eq!(reading.metric_f64("mode"), None);
        assert_eq!(reading.metric_f64("humidity"), None);
    }

    #[test]
    fn test_feedback_category_labels() {
        assert_eq!(
            FeedbackCategory::from_label("Too Hot"),
            Some(FeedbackCategory::TooHot)
        );
        assert_eq!(
            FeedbackCategory::from_label("Too Cold"),
            Some(FeedbackCategory::TooCold)
        );
        assert_eq!(FeedbackCategory::from_label("Just Right"), None);
    }

    #[test]
    fn test_fcu_payload_from_intent() {
        let now = Utc::now();
        let intent = CommandIntent::cool("fcu-1", 25.1, now);
        let payload = FcuCommandPayload::from_intent(&intent).unwrap();

        assert_eq!(payload.mode, 1);
        assert_eq!(payload.set_temperature, Some(25.1));
        assert_eq!(payload.source, "automation");
        assert!((payload.unix_timestamp - now.timestamp_micros() as f64 / 1e6).abs() < 1e-6);

        let fan = CommandIntent::new("fcu-1", CommandMode::Fan, now);
        let fan_payload = FcuCommandPayload::from_intent(&fan).unwrap();
        assert_eq!(fan_payload.mode, 3);
        assert_eq!(fan_payload.set_temperature, None);

        let oau = CommandIntent::new("oau-1", CommandMode::On, now);
        assert!(FcuCommandPayload::from_intent(&oau).is_none());
        assert_eq!(OauCommandPayload::from_intent(&oau).unwrap().mode, "on");
    }
}
