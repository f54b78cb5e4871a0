//! Per-zone FCU decision logic.
//!
//! `ComfortZoneController` is pure over pre-fetched readings: the dispatcher
//! owns sensor I/O and feedback state, fetches the windows, calls
//! [`ComfortZoneController::decide`], then applies the batch setpoint
//! policy (floor, tenant offset, anti-dedup jitter) before publish.

use chrono::{DateTime, Utc};
use tracing::debug;

use airlogic_core::config::{defaults, AutomationConfig, ComfortParams, ZoneDevices};
use airlogic_core::series;
use airlogic_core::types::{CommandIntent, CommandMode, Reading};

use crate::model::{adaptive_pmv, find_target_temperature};

/// Ordered thermal-comfort classification.
///
/// `D` is the worst case and also covers an undefined model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComfortBand {
    /// At or below the comfort minimum
    A,
    /// Between minimum and target
    B,
    /// Between target and maximum
    C,
    /// Above maximum, or model undefined
    D,
}

impl ComfortBand {
    /// Classify a current aPMV value against the configured thresholds.
    pub fn classify(current: Option<f64>, config: &AutomationConfig) -> Self {
        match current {
            None => ComfortBand::D,
            Some(value) if value > config.apmv_max => ComfortBand::D,
            Some(value) if value > config.apmv_target => ComfortBand::C,
            Some(value) if value > config.apmv_min => ComfortBand::B,
            Some(_) => ComfortBand::A,
        }
    }
}

/// FCU decision engine for one evaluation of one zone.
#[derive(Debug, Clone)]
pub struct ComfortZoneController {
    automation: AutomationConfig,
    comfort: ComfortParams,
}

impl ComfortZoneController {
    /// Create a controller over the configured thresholds and parameters.
    pub fn new(automation: AutomationConfig, comfort: ComfortParams) -> Self {
        Self {
            automation,
            comfort,
        }
    }

    /// Decide FCU command intents for a zone from its recent readings.
    ///
    /// Returns an empty batch when data is insufficient for a decision;
    /// skipping a cycle is the documented degradation, not an error.
    pub fn decide(
        &self,
        zone: &str,
        devices: &ZoneDevices,
        iaq_readings: &[Reading],
        fcu_readings: &[Reading],
        now: DateTime<Utc>,
    ) -> Vec<CommandIntent> {
        if devices.has_iaq() {
            self.decide_with_iaq(zone, devices, iaq_readings, fcu_readings, now)
        } else {
            self.decide_without_iaq(zone, devices, fcu_readings, now)
        }
    }

    /// Zone without IAQ sensors: steer only the units currently running,
    /// at a setpoint derived from an assumed 50% humidity.
    fn decide_without_iaq(
        &self,
        zone: &str,
        devices: &ZoneDevices,
        fcu_readings: &[Reading],
        now: DateTime<Utc>,
    ) -> Vec<CommandIntent> {
        if fcu_readings.is_empty() {
            debug!(zone, "no FCU telemetry, skipping cycle");
            return Vec::new();
        }

        // A unit counts as on only if no mode sample in the window reports off.
        let modes = series::metric_values_per_device(fcu_readings, "mode");
        let running: Vec<&str> = devices
            .fcu_device_ids
            .iter()
            .filter(|id| {
                modes.get(id).is_some_and(|samples| {
                    !samples.is_empty()
                        && samples
                            .iter()
                            .all(|v| v.as_str().map_or(true, |s| !s.contains("off")))
                })
            })
            .map(String::as_str)
            .collect();

        let setpoint = self.target_setpoint(
            self.automation.apmv_target,
            defaults::ASSUMED_HUMIDITY,
            false,
        );
        debug!(zone, ?running, setpoint, "no-IAQ branch decision");
        running
            .into_iter()
            .map(|id| CommandIntent::cool(id, setpoint as f64, now))
            .collect()
    }

    /// Zone with IAQ sensors: classify the latest aPMV bucket, with the
    /// humidity override checked first.
    fn decide_with_iaq(
        &self,
        zone: &str,
        devices: &ZoneDevices,
        iaq_readings: &[Reading],
        fcu_readings: &[Reading],
        now: DateTime<Utc>,
    ) -> Vec<CommandIntent> {
        if iaq_readings.is_empty() || fcu_readings.is_empty() {
            debug!(zone, "incomplete telemetry, skipping cycle");
            return Vec::new();
        }

        let bucket = defaults::RESAMPLE_BUCKET_MINUTES;
        let temperature = series::mean_by_bucket(iaq_readings, "temperature", bucket);
        let humidity = series::mean_by_bucket(iaq_readings, "humidity", bucket);

        // aPMV of the latest bucket; either metric missing means undefined.
        let current_apmv = temperature
            .iter()
            .next_back()
            .and_then(|(bucket_ts, tdb)| {
                let rh = humidity.get(bucket_ts)?;
                adaptive_pmv(
                    *tdb,
                    *tdb,
                    self.comfort.air_velocity,
                    *rh,
                    self.comfort.metabolic_rate,
                    self.comfort.clothing,
                    self.comfort.adaptive_coefficient,
                )
            });
        let band = ComfortBand::classify(current_apmv, &self.automation);

        let current_humidity = humidity
            .values()
            .next_back()
            .copied()
            .unwrap_or(defaults::FALLBACK_HUMIDITY);
        let humidity_mean = series::window_mean(iaq_readings, "humidity");

        debug!(
            zone,
            apmv = ?current_apmv,
            ?band,
            current_humidity,
            humidity_mean = ?humidity_mean,
            "comfort classification"
        );

        // Humidity override short-circuits the comfort branch.
        if humidity_mean.is_some_and(|mean| mean >= self.automation.rh_max) {
            return match band {
                ComfortBand::A | ComfortBand::B => {
                    self.intents(devices, CommandMode::Dry, None, now)
                }
                ComfortBand::C | ComfortBand::D => {
                    // Pre-cool towards the comfort minimum, rounding down.
                    let setpoint =
                        self.target_setpoint(self.automation.apmv_min, current_humidity, true);
                    self.intents(devices, CommandMode::Cool, Some(setpoint as f64), now)
                }
            };
        }

        match band {
            ComfortBand::A => self.intents(devices, CommandMode::Fan, None, now),
            ComfortBand::B | ComfortBand::C => {
                let setpoint =
                    self.target_setpoint(self.automation.apmv_target, current_humidity, false);
                self.intents(devices, CommandMode::Cool, Some(setpoint as f64), now)
            }
            ComfortBand::D => {
                let setpoint =
                    self.target_setpoint(self.automation.apmv_target, current_humidity, true);
                self.intents(devices, CommandMode::Cool, Some(setpoint as f64), now)
            }
        }
    }

    fn target_setpoint(&self, target_pmv: f64, rh: f64, prefer_lower: bool) -> i32 {
        find_target_temperature(
            target_pmv,
            rh,
            None,
            self.comfort.air_velocity,
            self.comfort.metabolic_rate,
            self.comfort.clothing,
            self.comfort.adaptive_coefficient,
            prefer_lower,
        )
    }

    fn intents(
        &self,
        devices: &ZoneDevices,
        mode: CommandMode,
        setpoint: Option<f64>,
        now: DateTime<Utc>,
    ) -> Vec<CommandIntent> {
        devices
            .fcu_device_ids
            .iter()
            .map(|id| CommandIntent {
                device_id: id.clone(),
                mode,
                setpoint,
                timestamp: now,
            })
            .collect()
    }
}

/// Apply the uniform setpoint policy to a command batch before publish.
///
/// Every Cool intent carrying a setpoint gets: the 24-degree floor (raised
/// when at or below it), the zone's tenant feedback offset, and the
/// alternating jitter that keeps the downstream gateway from silently
/// deduplicating a repeated value.
pub fn apply_setpoint_policy(intents: &mut [CommandIntent], offset: i8, jitter: f64) {
    for intent in intents.iter_mut() {
        if intent.mode != CommandMode::Cool {
            continue;
        }
        if let Some(setpoint) = intent.setpoint.as_mut() {
            if *setpoint <= defaults::SETPOINT_FLOOR {
                *setpoint = defaults::SETPOINT_FLOOR;
            }
            *setpoint += offset as f64;
            *setpoint += jitter;
        }
    }
}
