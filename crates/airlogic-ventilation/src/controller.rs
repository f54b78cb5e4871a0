//! CO2 hysteresis state machine.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use airlogic_core::config::ZoneDevices;
use airlogic_core::series;
use airlogic_core::types::{CommandIntent, Reading, VentilationState};

/// OAU decision engine for one evaluation of one zone.
///
/// Stateless over the readings; the resulting [`VentilationState`] is
/// stored by the caller inside the zone's runtime record.
#[derive(Debug, Clone, Copy)]
pub struct VentilationController {
    co2_on: f64,
    co2_off: f64,
}

impl VentilationController {
    /// Create a controller over the configured thresholds.
    pub fn new(co2_on: f64, co2_off: f64) -> Self {
        Self { co2_on, co2_off }
    }

    /// Evaluate the next ventilation state from the latest CO2 reading of
    /// every mapped IAQ device.
    ///
    /// A device with no reading yet counts as 0 ppm: it can never trigger
    /// On but does satisfy the all-below-off condition. That is the
    /// documented conservative default, not an error.
    pub fn next_state(&self, zone: &str, devices: &ZoneDevices, readings: &[Reading]) -> VentilationState {
        let latest = series::latest_per_device(readings);
        let levels: Vec<f64> = devices
            .iaq_device_ids
            .iter()
            .map(|id| {
                latest
                    .get(id.as_str())
                    .and_then(|reading| reading.metric_f64("co2"))
                    .unwrap_or(0.0)
            })
            .collect();

        if levels.iter().all(|co2| *co2 < self.co2_off) {
            info!(zone, ?levels, "all CO2 levels below threshold, ventilation off");
            VentilationState::Off
        } else if levels.iter().any(|co2| *co2 > self.co2_on) {
            info!(zone, ?levels, "CO2 level exceeds threshold, ventilation on");
            VentilationState::On
        } else {
            debug!(zone, ?levels, "CO2 inside hysteresis band, holding");
            VentilationState::Indeterminate
        }
    }

    /// Evaluate and emit command intents for the zone's OAU devices.
    ///
    /// On/Off transitions yield exactly one intent per mapped OAU device;
    /// Indeterminate yields none.
    pub fn decide(
        &self,
        zone: &str,
        devices: &ZoneDevices,
        readings: &[Reading],
        now: DateTime<Utc>,
    ) -> (VentilationState, Vec<CommandIntent>) {
        let state = self.next_state(zone, devices, readings);
        let intents = match state.command_mode() {
            Some(mode) => devices
                .oau_device_ids
                .iter()
                .map(|id| CommandIntent::new(id.clone(), mode, now))
                .collect(),
            None => Vec::new(),
        };
        (state, intents)
    }
}
