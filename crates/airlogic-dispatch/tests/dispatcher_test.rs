//! Dispatcher integration tests with mock collaborators.
//!
//! A canned sensor provider and a capturing publisher stand in for the
//! time-series database and the message bus.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use airlogic_core::config::{EngineConfig, ZoneDevices};
use airlogic_core::types::{DeviceId, Reading};
use airlogic_core::{
    AirlogicError, CommandPublisher, PublishHeaders, Result, SensorDataProvider, TimeWindow,
};
use airlogic_dispatch::Dispatcher;

/// Provider serving a fixed set of readings, or failing on demand.
struct CannedProvider {
    readings: Vec<Reading>,
    fail: bool,
}

#[async_trait]
impl SensorDataProvider for CannedProvider {
    async fn fetch(&self, device_ids: &[DeviceId], window: TimeWindow) -> Result<Vec<Reading>> {
        if self.fail {
            return Err(AirlogicError::Provider("database unreachable".to_string()));
        }
        Ok(self
            .readings
            .iter()
            .filter(|r| device_ids.contains(&r.device_id) && window.contains(r.timestamp))
            .cloned()
            .collect())
    }
}

/// Publisher that records every message it sees.
#[derive(Default)]
struct CapturingPublisher {
    published: Mutex<Vec<(String, Value)>>,
}

impl CapturingPublisher {
    async fn messages(&self) -> Vec<(String, Value)> {
        self.published.lock().await.clone()
    }

    async fn fcu_setpoints(&self) -> Vec<f64> {
        self.messages()
            .await
            .iter()
            .filter(|(topic, _)| topic.contains("fcu_control"))
            .filter_map(|(_, payload)| payload["set_temperature"].as_f64())
            .collect()
    }
}

#[async_trait]
impl CommandPublisher for CapturingPublisher {
    async fn publish(&self, topic: &str, payload: Value, _headers: &PublishHeaders) -> Result<()> {
        self.published
            .lock()
            .await
            .push((topic.to_string(), payload));
        Ok(())
    }
}

fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.zones.insert(
        "zone-1".to_string(),
        ZoneDevices {
            fcu_device_ids: vec!["fcu-1".to_string()],
            oau_device_ids: vec!["oau-1".to_string()],
            iaq_device_ids: vec!["iaq-1".to_string()],
        },
    );
    config
}

/// Warm, dry, well-ventilated zone telemetry over the last 15 minutes.
fn warm_zone_readings(now: DateTime<Utc>) -> Vec<Reading> {
    let mut readings = Vec::new();
    for i in 1..=3 {
        readings.push(
            Reading::new("iaq-1", now - Duration::minutes(i * 4))
                .with_metric("temperature", 29.0)
                .with_metric("humidity", 50.0)
                .with_metric("co2", 500.0),
        );
        readings.push(
            Reading::new("fcu-1", now - Duration::minutes(i * 4))
                .with_metric("mode", "cool")
                .with_metric("temperature", 28.0)
                .with_metric("set_temperature", 25.0),
        );
    }
    readings
}

fn dispatcher_with(
    readings: Vec<Reading>,
    fail: bool,
) -> (Arc<Dispatcher>, Arc<CapturingPublisher>) {
    let provider = Arc::new(CannedProvider { readings, fail });
    let publisher = Arc::new(CapturingPublisher::default());
    let dispatcher = Arc::new(
        Dispatcher::new(test_config(), provider, Arc::clone(&publisher) as _)
            .expect("valid test config"),
    );
    (dispatcher, publisher)
}

#[tokio::test]
async fn sweep_publishes_fcu_and_oau_commands() {
    let now = Utc::now();
    let (dispatcher, publisher) = dispatcher_with(warm_zone_readings(now), false);

    dispatcher.sweep().await;

    let messages = publisher.messages().await;
    let fcu: Vec<_> = messages
        .iter()
        .filter(|(topic, _)| topic == "mqtt/fcu_control/fcu-1/command")
        .collect();
    let oau: Vec<_> = messages
        .iter()
        .filter(|(topic, _)| topic == "hvac/bac0hvac/oau-1/command")
        .collect();

    // Warm zone: a cool command with a floored, jittered setpoint
    assert_eq!(fcu.len(), 1);
    let payload = &fcu[0].1;
    assert_eq!(payload["mode"], 1);
    assert_eq!(payload["source"], "automation");
    let setpoint = payload["set_temperature"].as_f64().unwrap();
    assert!(setpoint >= 24.1, "floor + jitter, got {setpoint}");

    // CO2 at 500 is below the off threshold on every device
    assert_eq!(oau.len(), 1);
    assert_eq!(oau[0].1["mode"], "off");
    assert_eq!(oau[0].1["subdevice_idx"], 0);
}

#[tokio::test]
async fn consecutive_sweeps_alternate_jitter() {
    let now = Utc::now();
    let (dispatcher, publisher) = dispatcher_with(warm_zone_readings(now), false);

    dispatcher.sweep().await;
    dispatcher.sweep().await;

    let setpoints = publisher.fcu_setpoints().await;
    assert_eq!(setpoints.len(), 2);
    // Identical classification, so only the jitter differs: 0.1 vs 0.2
    let delta = setpoints[1] - setpoints[0];
    assert!(
        (delta - 0.1).abs() < 1e-9,
        "expected jitter delta 0.1, got {delta}"
    );
}

#[tokio::test]
async fn feedback_shifts_the_published_setpoint() {
    let now = Utc::now();
    let (dispatcher, publisher) = dispatcher_with(warm_zone_readings(now), false);

    // Baseline sweep: offset 0, jitter 0.1
    dispatcher.sweep().await;

    // A hot vote drops the offset to -1; the immediate re-evaluation uses
    // jitter 0.2, so the setpoint moves by exactly -1 + 0.1
    dispatcher
        .handle_feedback(json!({
            "feedback": "Too Hot",
            "zone": "zone-1",
            "lineId": "U123",
        }))
        .await
        .expect("valid feedback");

    let setpoints = publisher.fcu_setpoints().await;
    assert_eq!(setpoints.len(), 2);
    let delta = setpoints[1] - setpoints[0];
    assert!(
        (delta + 0.9).abs() < 1e-9,
        "expected shift of -0.9, got {delta}"
    );
}

#[tokio::test]
async fn malformed_feedback_is_dropped_without_publishing() {
    let (dispatcher, publisher) = dispatcher_with(Vec::new(), false);

    for payload in [
        json!({ "zone": "zone-1", "lineId": "U1" }),
        json!({ "feedback": "Too Warm-ish", "zone": "zone-1", "lineId": "U1" }),
        json!(42),
    ] {
        let result = dispatcher.handle_feedback(payload).await;
        assert!(matches!(result, Err(AirlogicError::InvalidFeedback(_))));
    }

    assert!(publisher.messages().await.is_empty());
}

#[tokio::test]
async fn unknown_zone_feedback_is_dropped() {
    let (dispatcher, publisher) = dispatcher_with(Vec::new(), false);

    let result = dispatcher
        .handle_feedback(json!({
            "feedback": "Too Cold",
            "zone": "penthouse",
            "lineId": "U1",
        }))
        .await;

    assert!(matches!(result, Err(AirlogicError::UnknownZone(zone)) if zone == "penthouse"));
    assert!(publisher.messages().await.is_empty());
}

#[tokio::test]
async fn provider_failure_skips_the_cycle() {
    let now = Utc::now();
    let (dispatcher, publisher) = dispatcher_with(warm_zone_readings(now), true);

    // The sweep must complete without publishing or panicking
    dispatcher.sweep().await;
    assert!(publisher.messages().await.is_empty());
}

#[tokio::test]
async fn reconfigure_resets_zone_state() {
    let now = Utc::now();
    let (dispatcher, publisher) = dispatcher_with(warm_zone_readings(now), false);

    dispatcher.sweep().await; // consumes jitter 0.1
    dispatcher.reconfigure(test_config()).await.unwrap();
    dispatcher.sweep().await; // fresh zone state starts over at 0.1

    let setpoints = publisher.fcu_setpoints().await;
    assert_eq!(setpoints.len(), 2);
    assert!(
        (setpoints[1] - setpoints[0]).abs() < 1e-9,
        "reconfigured zone repeats the first jitter phase"
    );
}

#[tokio::test]
async fn run_loop_stops_on_shutdown() {
    let (dispatcher, _publisher) = dispatcher_with(Vec::new(), false);
    let (feedback_tx, feedback_rx) = tokio::sync::mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let handle = tokio::spawn(Arc::clone(&dispatcher).run(feedback_rx, shutdown_rx));

    // Feed one malformed event through the live loop, then stop
    feedback_tx.send(json!({ "bogus": true })).await.unwrap();
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("dispatcher stopped on shutdown signal")
        .expect("dispatcher task completed");
}
