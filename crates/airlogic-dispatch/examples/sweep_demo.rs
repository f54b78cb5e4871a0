//! End-to-end demo: one zone, canned telemetry, stdout publisher.
//!
//! Run with `cargo run --example sweep_demo` (RUST_LOG=debug for the
//! decision trace).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Value};

use airlogic_core::config::{EngineConfig, ZoneDevices};
use airlogic_core::types::{DeviceId, Reading};
use airlogic_core::{CommandPublisher, PublishHeaders, Result, SensorDataProvider, TimeWindow};
use airlogic_dispatch::Dispatcher;

/// Serves a warm, slightly humid zone for any queried window.
struct DemoProvider;

#[async_trait]
impl SensorDataProvider for DemoProvider {
    async fn fetch(&self, device_ids: &[DeviceId], window: TimeWindow) -> Result<Vec<Reading>> {
        let mut readings = Vec::new();
        for minutes in [2, 6, 11] {
            let ts = window.end - Duration::minutes(minutes);
            for id in device_ids {
                let reading = if id.starts_with("iaq") {
                    Reading::new(id.clone(), ts)
                        .with_metric("temperature", 28.5)
                        .with_metric("humidity", 58.0)
                        .with_metric("co2", 1150.0)
                } else {
                    Reading::new(id.clone(), ts)
                        .with_metric("mode", "cool")
                        .with_metric("temperature", 27.0)
                        .with_metric("set_temperature", 25.0)
                };
                readings.push(reading);
            }
        }
        Ok(readings)
    }
}

/// Prints every command instead of talking to a broker.
struct StdoutPublisher;

#[async_trait]
impl CommandPublisher for StdoutPublisher {
    async fn publish(&self, topic: &str, payload: Value, headers: &PublishHeaders) -> Result<()> {
        println!(
            "[{}] {topic} -> {payload}",
            headers.requester_id
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = EngineConfig::default();
    config.zones.insert(
        "creative-arena".to_string(),
        ZoneDevices {
            fcu_device_ids: vec!["fcu-101".to_string(), "fcu-102".to_string()],
            oau_device_ids: vec!["oau-201".to_string()],
            iaq_device_ids: vec!["iaq-301".to_string()],
        },
    );

    let dispatcher = Arc::new(Dispatcher::new(
        config,
        Arc::new(DemoProvider),
        Arc::new(StdoutPublisher),
    )?);

    println!("--- periodic sweep ---");
    dispatcher.sweep().await;

    println!("--- tenant votes too hot ---");
    dispatcher
        .handle_feedback(json!({
            "feedback": "Too Hot",
            "zone": "creative-arena",
            "lineId": "U87d0284d6b783f8fbb4af8bd050ba1e6",
        }))
        .await?;

    Ok(())
}
