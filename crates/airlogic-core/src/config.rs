//! Configuration surface for the automation core.
//!
//! The host loads this as plain structured data (TOML/JSON); loading and
//! hot-reload plumbing live outside this core. Every field carries the
//! documented default so a partial config is always usable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{DeviceId, ZoneName};

/// Documented constants of the decision engine.
pub mod defaults {
    /// Lower bound of the setpoint scan range (deg C).
    pub const SETPOINT_SCAN_MIN: i32 = 18;
    /// Upper bound of the setpoint scan range (deg C).
    pub const SETPOINT_SCAN_MAX: i32 = 30;
    /// Returned when no scan candidate satisfies the comfort target.
    pub const FALLBACK_SETPOINT: i32 = 25;
    /// Hard floor applied to computed setpoints before offset/jitter.
    pub const SETPOINT_FLOOR: f64 = 24.0;
    /// Humidity assumed for zones without an IAQ sensor (percent).
    pub const ASSUMED_HUMIDITY: f64 = 50.0;
    /// Humidity used when a zone has IAQ sensors but no humidity samples.
    pub const FALLBACK_HUMIDITY: f64 = 55.0;
    /// Alternating jitter added to setpoints so the downstream gateway does
    /// not deduplicate a semantically unchanged command.
    pub const JITTER_OPTIONS: [f64; 2] = [0.1, 0.2];
    /// Resampling bucket width (minutes).
    pub const RESAMPLE_BUCKET_MINUTES: i64 = 5;
    /// FCU telemetry window for zones without IAQ sensors (minutes).
    pub const NO_IAQ_FCU_WINDOW_MINUTES: i64 = 30;
    /// Cadence of the memory-bounding feedback prune sweep (minutes).
    pub const FEEDBACK_MAINTENANCE_MINUTES: i64 = 120;
}

fn default_apmv_min() -> f64 {
    0.0
}
fn default_apmv_target() -> f64 {
    0.25
}
fn default_apmv_max() -> f64 {
    0.5
}
fn default_rh_max() -> f64 {
    60.0
}
fn default_trigger_interval() -> u64 {
    15
}
fn default_lookback() -> i64 {
    15
}
fn default_feedback_expiry() -> i64 {
    30
}
fn default_co2_on() -> f64 {
    1000.0
}
fn default_co2_off() -> f64 {
    800.0
}
fn default_io_timeout() -> u64 {
    10
}
fn default_air_velocity() -> f64 {
    0.1
}
fn default_metabolic_rate() -> f64 {
    1.1
}
fn default_clothing() -> f64 {
    0.65
}
fn default_adaptive_coefficient() -> f64 {
    0.2
}

/// Automation thresholds and cadences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// aPMV below which the zone is fully comfortable (band A boundary)
    #[serde(default = "default_apmv_min")]
    pub apmv_min: f64,
    /// aPMV the controller steers towards (band B boundary)
    #[serde(default = "default_apmv_target")]
    pub apmv_target: f64,
    /// aPMV above which the zone is uncomfortable (band C boundary)
    #[serde(default = "default_apmv_max")]
    pub apmv_max: f64,
    /// Relative humidity override threshold (percent)
    #[serde(default = "default_rh_max")]
    pub rh_max: f64,
    /// Full-sweep evaluation interval (minutes)
    #[serde(default = "default_trigger_interval")]
    pub trigger_interval_minutes: u64,
    /// Telemetry lookback window (minutes)
    #[serde(default = "default_lookback")]
    pub lookback_minutes: i64,
    /// Tenant feedback expiry (minutes)
    #[serde(default = "default_feedback_expiry")]
    pub feedback_expiry_minutes: i64,
    /// CO2 level above which ventilation turns on (ppm)
    #[serde(default = "default_co2_on")]
    pub co2_on: f64,
    /// CO2 level below which ventilation turns off (ppm)
    #[serde(default = "default_co2_off")]
    pub co2_off: f64,
    /// Bound on sensor fetch and publish calls (seconds)
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            apmv_min: default_apmv_min(),
            apmv_target: default_apmv_target(),
            apmv_max: default_apmv_max(),
            rh_max: default_rh_max(),
            trigger_interval_minutes: default_trigger_interval(),
            lookback_minutes: default_lookback(),
            feedback_expiry_minutes: default_feedback_expiry(),
            co2_on: default_co2_on(),
            co2_off: default_co2_off(),
            io_timeout_secs: default_io_timeout(),
        }
    }
}

/// Physical parameters of the adaptive comfort model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComfortParams {
    /// Relative air velocity (m/s)
    #[serde(default = "default_air_velocity")]
    pub air_velocity: f64,
    /// Metabolic rate (met)
    #[serde(default = "default_metabolic_rate")]
    pub metabolic_rate: f64,
    /// Clothing insulation (clo)
    #[serde(default = "default_clothing")]
    pub clothing: f64,
    /// Adaptive coefficient of the aPMV model
    #[serde(default = "default_adaptive_coefficient")]
    pub adaptive_coefficient: f64,
}

impl Default for ComfortParams {
    fn default() -> Self {
        Self {
            air_velocity: default_air_velocity(),
            metabolic_rate: default_metabolic_rate(),
            clothing: default_clothing(),
            adaptive_coefficient: default_adaptive_coefficient(),
        }
    }
}

/// Device IDs mapped to one thermal zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneDevices {
    /// Fan-coil units commanded by the comfort controller
    #[serde(default)]
    pub fcu_device_ids: Vec<DeviceId>,
    /// Outdoor-air units commanded by the ventilation controller
    #[serde(default)]
    pub oau_device_ids: Vec<DeviceId>,
    /// Indoor-air-quality sensors read for both controllers
    #[serde(default)]
    pub iaq_device_ids: Vec<DeviceId>,
}

impl ZoneDevices {
    /// Whether this zone has any IAQ sensor mapped.
    pub fn has_iaq(&self) -> bool {
        !self.iaq_device_ids.is_empty()
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Automation thresholds and cadences
    #[serde(default)]
    pub automation: AutomationConfig,
    /// Comfort-model physical parameters
    #[serde(default)]
    pub comfort: ComfortParams,
    /// Zone name to device mapping
    #[serde(default)]
    pub zones: HashMap<ZoneName, ZoneDevices>,
}

impl EngineConfig {
    /// Sanity-check threshold ordering.
    pub fn validate(&self) -> crate::Result<()> {
        let a = &self.automation;
        if a.apmv_min > a.apmv_target || a.apmv_target > a.apmv_max {
            return Err(crate::AirlogicError::Config(format!(
                "aPMV thresholds must be ordered: min={} target={} max={}",
                a.apmv_min, a.apmv_target, a.apmv_max
            )));
        }
        if a.co2_off >= a.co2_on {
            return Err(crate::AirlogicError::Config(format!(
                "CO2 hysteresis band is empty: off={} on={}",
                a.co2_off, a.co2_on
            )));
        }
        if a.trigger_interval_minutes == 0 {
            return Err(crate::AirlogicError::Config(
                "trigger_interval_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
