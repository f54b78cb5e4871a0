//! Comfort controller decision tests.
//!
//! Exercises both branches of the FCU decision: zones with IAQ sensors
//! (classification + humidity override) and zones without (telemetry-only).

use chrono::{DateTime, Duration, Utc};

use airlogic_comfort::ComfortZoneController;
use airlogic_core::config::{AutomationConfig, ComfortParams, ZoneDevices};
use airlogic_core::types::{CommandMode, Reading};

fn controller() -> ComfortZoneController {
    ComfortZoneController::new(AutomationConfig::default(), ComfortParams::default())
}

fn iaq_zone() -> ZoneDevices {
    ZoneDevices {
        fcu_device_ids: vec!["fcu-1".to_string(), "fcu-2".to_string()],
        oau_device_ids: vec![],
        iaq_device_ids: vec!["iaq-1".to_string()],
    }
}

fn no_iaq_zone() -> ZoneDevices {
    ZoneDevices {
        fcu_device_ids: vec!["fcu-1".to_string(), "fcu-2".to_string()],
        oau_device_ids: vec![],
        iaq_device_ids: vec![],
    }
}

/// IAQ readings at a constant temperature/humidity over the last 15 min.
fn iaq_readings(now: DateTime<Utc>, temperature: f64, humidity: f64) -> Vec<Reading> {
    (1..=3)
        .map(|i| {
            Reading::new("iaq-1", now - Duration::minutes(i * 4))
                .with_metric("temperature", temperature)
                .with_metric("humidity", humidity)
        })
        .collect()
}

fn fcu_readings(now: DateTime<Utc>, device_id: &str, mode: &str) -> Vec<Reading> {
    (1..=3)
        .map(|i| {
            Reading::new(device_id, now - Duration::minutes(i * 4))
                .with_metric("mode", mode)
                .with_metric("temperature", 25.0)
        })
        .collect()
}

#[test]
fn cold_zone_gets_fan_mode() {
    let now = Utc::now();
    let intents = controller().decide(
        "zone-1",
        &iaq_zone(),
        &iaq_readings(now, 18.0, 50.0),
        &fcu_readings(now, "fcu-1", "cool"),
        now,
    );

    assert_eq!(intents.len(), 2);
    for intent in &intents {
        assert_eq!(intent.mode, CommandMode::Fan);
        assert_eq!(intent.setpoint, None);
    }
}

#[test]
fn warm_zone_gets_cool_mode_with_setpoint() {
    let now = Utc::now();
    let intents = controller().decide(
        "zone-1",
        &iaq_zone(),
        &iaq_readings(now, 29.0, 50.0),
        &fcu_readings(now, "fcu-1", "cool"),
        now,
    );

    assert_eq!(intents.len(), 2);
    for intent in &intents {
        assert_eq!(intent.mode, CommandMode::Cool);
        let setpoint = intent.setpoint.expect("cool intent carries a setpoint");
        assert!((18.0..=30.0).contains(&setpoint));
    }
}

#[test]
fn humid_comfortable_zone_gets_dry_mode() {
    let now = Utc::now();
    // Cold enough for band A, but window humidity is above rh_max
    let intents = controller().decide(
        "zone-1",
        &iaq_zone(),
        &iaq_readings(now, 18.0, 70.0),
        &fcu_readings(now, "fcu-1", "cool"),
        now,
    );

    assert_eq!(intents.len(), 2);
    for intent in &intents {
        assert_eq!(intent.mode, CommandMode::Dry);
        assert_eq!(intent.setpoint, None);
    }
}

#[test]
fn humid_warm_zone_precools() {
    let now = Utc::now();
    let intents = controller().decide(
        "zone-1",
        &iaq_zone(),
        &iaq_readings(now, 29.0, 70.0),
        &fcu_readings(now, "fcu-1", "cool"),
        now,
    );

    assert_eq!(intents.len(), 2);
    for intent in &intents {
        assert_eq!(intent.mode, CommandMode::Cool);
        assert!(intent.setpoint.is_some());
    }
}

#[test]
fn undefined_model_output_is_worst_case() {
    let now = Utc::now();
    // 35C is outside the model's applicability window, so the aPMV is
    // undefined and classification must fall to the worst case (cool).
    let intents = controller().decide(
        "zone-1",
        &iaq_zone(),
        &iaq_readings(now, 35.0, 50.0),
        &fcu_readings(now, "fcu-1", "cool"),
        now,
    );

    assert_eq!(intents.len(), 2);
    for intent in &intents {
        assert_eq!(intent.mode, CommandMode::Cool);
        assert!(intent.setpoint.is_some());
    }
}

#[test]
fn missing_telemetry_skips_cycle() {
    let now = Utc::now();
    let controller = controller();

    // IAQ zone with no IAQ data
    let intents = controller.decide(
        "zone-1",
        &iaq_zone(),
        &[],
        &fcu_readings(now, "fcu-1", "cool"),
        now,
    );
    assert!(intents.is_empty());

    // IAQ zone with no FCU data
    let intents = controller.decide(
        "zone-1",
        &iaq_zone(),
        &iaq_readings(now, 26.0, 50.0),
        &[],
        now,
    );
    assert!(intents.is_empty());

    // No-IAQ zone with no FCU data
    let intents = controller.decide("zone-1", &no_iaq_zone(), &[], &[], now);
    assert!(intents.is_empty());
}

#[test]
fn no_iaq_zone_commands_only_running_units() {
    let now = Utc::now();
    let mut readings = fcu_readings(now, "fcu-1", "cool");
    readings.extend(fcu_readings(now, "fcu-2", "cool"));
    // One off sample disqualifies fcu-2 for the whole window
    readings.push(Reading::new("fcu-2", now - Duration::minutes(2)).with_metric("mode", "\"off\""));

    let intents = controller().decide("zone-1", &no_iaq_zone(), &[], &readings, now);

    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].device_id, "fcu-1");
    assert_eq!(intents[0].mode, CommandMode::Cool);
    let setpoint = intents[0].setpoint.expect("assumed-humidity setpoint");
    assert!((18.0..=30.0).contains(&setpoint));
}

#[test]
fn no_iaq_zone_ignores_units_without_mode_samples() {
    let now = Utc::now();
    // fcu-2 reports temperature but never a mode; it must not be commanded
    let mut readings = fcu_readings(now, "fcu-1", "cool");
    readings.push(Reading::new("fcu-2", now - Duration::minutes(3)).with_metric("temperature", 25.0));

    let intents = controller().decide("zone-1", &no_iaq_zone(), &[], &readings, now);

    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].device_id, "fcu-1");
}
