//! Evaluation scheduling and command publishing.
//!
//! Two trigger sources drive the same per-zone evaluation: a periodic full
//! sweep and the asynchronous tenant-feedback stream. Zones evaluate
//! independently and possibly in parallel; within one zone everything runs
//! under the zone mutex, so a feedback-triggered evaluation and the sweep
//! never interleave on the same offset and ventilation state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use airlogic_comfort::{apply_setpoint_policy, ComfortZoneController};
use airlogic_core::config::{defaults, EngineConfig};
use airlogic_core::types::{
    CommandIntent, DeviceId, FcuCommandPayload, OauCommandPayload, Reading,
};
use airlogic_core::{
    AirlogicError, CommandPublisher, PublishHeaders, Result, SensorDataProvider, TimeWindow,
};
use airlogic_ventilation::VentilationController;

use crate::ingest::FeedbackMessage;
use crate::registry::{ZoneRegistry, ZoneRuntime};

/// Topic a FCU command is published on.
pub fn fcu_command_topic(device_id: &str) -> String {
    format!("mqtt/fcu_control/{device_id}/command")
}

/// Topic an OAU command is published on.
pub fn oau_command_topic(device_id: &str) -> String {
    format!("hvac/bac0hvac/{device_id}/command")
}

/// One configuration's worth of engine state. Immutable once built;
/// reconfiguration swaps in a fresh snapshot, and evaluations already in
/// flight complete against the old one.
struct Engine {
    config: EngineConfig,
    comfort: ComfortZoneController,
    ventilation: VentilationController,
    registry: ZoneRegistry,
}

impl Engine {
    fn build(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let comfort =
            ComfortZoneController::new(config.automation.clone(), config.comfort);
        let ventilation =
            VentilationController::new(config.automation.co2_on, config.automation.co2_off);
        let registry = ZoneRegistry::from_config(&config.zones);
        Ok(Self {
            config,
            comfort,
            ventilation,
            registry,
        })
    }

    fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.config.automation.io_timeout_secs)
    }
}

/// Schedules zone evaluations and publishes the resulting commands.
pub struct Dispatcher {
    engine: tokio::sync::RwLock<Arc<Engine>>,
    provider: Arc<dyn SensorDataProvider>,
    publisher: Arc<dyn CommandPublisher>,
    headers: PublishHeaders,
}

impl Dispatcher {
    /// Build a dispatcher over validated configuration and the two
    /// external collaborators.
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn SensorDataProvider>,
        publisher: Arc<dyn CommandPublisher>,
    ) -> Result<Self> {
        Ok(Self {
            engine: tokio::sync::RwLock::new(Arc::new(Engine::build(config)?)),
            provider,
            publisher,
            headers: PublishHeaders::command("hvac_automation"),
        })
    }

    /// Replace the configuration. Zone state (feedback windows, ventilation
    /// state, jitter phase) resets; evaluations already in flight complete
    /// against the old snapshot and the next sweep picks up the new one.
    pub async fn reconfigure(&self, config: EngineConfig) -> Result<()> {
        let engine = Arc::new(Engine::build(config)?);
        info!(zones = engine.registry.len(), "dispatcher reconfigured");
        *self.engine.write().await = engine;
        Ok(())
    }

    async fn engine(&self) -> Arc<Engine> {
        Arc::clone(&*self.engine.read().await)
    }

    /// Names of the currently configured zones.
    pub async fn zone_names(&self) -> Vec<String> {
        self.engine().await.registry.names()
    }

    /// Run the scheduling loop until `shutdown` flips to true or the
    /// feedback channel closes. No failure path terminates the loop.
    pub async fn run(
        self: Arc<Self>,
        mut feedback_rx: mpsc::Receiver<Value>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let trigger = {
            let engine = self.engine().await;
            Duration::from_secs(engine.config.automation.trigger_interval_minutes * 60)
        };
        let mut sweep_tick = tokio::time::interval(trigger);
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Slow prune sweep bounds feedback memory even when no feedback
        // or evaluation ever touches a zone.
        let mut maintenance_tick = tokio::time::interval(Duration::from_secs(
            defaults::FEEDBACK_MAINTENANCE_MINUTES as u64 * 60,
        ));
        maintenance_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("dispatcher started");
        loop {
            tokio::select! {
                _ = sweep_tick.tick() => {
                    self.sweep().await;
                }
                _ = maintenance_tick.tick() => {
                    self.prune_feedback().await;
                }
                message = feedback_rx.recv() => {
                    match message {
                        Some(payload) => {
                            if let Err(err) = self.handle_feedback(payload).await {
                                warn!(%err, "feedback event dropped");
                            }
                        }
                        None => {
                            info!("feedback channel closed, stopping dispatcher");
                            break;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("dispatcher shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Evaluate every configured zone once: feedback prune + offset, FCU
    /// comfort decision, OAU ventilation decision, publish. Zones run as
    /// independent tasks; a failing zone never blocks the others.
    pub async fn sweep(&self) {
        let engine = self.engine().await;
        let names = engine.registry.names();
        debug!(zones = names.len(), "starting evaluation sweep");

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let Some(runtime) = engine.registry.get(&name) else {
                continue;
            };
            let engine = Arc::clone(&engine);
            let provider = Arc::clone(&self.provider);
            let publisher = Arc::clone(&self.publisher);
            let headers = self.headers.clone();
            handles.push(tokio::spawn(async move {
                evaluate_zone(&engine, &provider, &publisher, &headers, &name, &runtime).await;
            }));
        }
        for result in futures::future::join_all(handles).await {
            if let Err(err) = result {
                error!(%err, "zone evaluation task panicked");
            }
        }
    }

    /// Handle one tenant feedback payload: validate, record the vote, and
    /// immediately re-evaluate the named zone's comfort decision so the
    /// command reflects the new offset without waiting for the next sweep.
    /// Ventilation stays on its periodic cadence.
    pub async fn handle_feedback(&self, payload: Value) -> Result<()> {
        let message = FeedbackMessage::parse(&payload)?;
        let category = message.category()?;

        let engine = self.engine().await;
        let Some(runtime) = engine.registry.get(&message.zone) else {
            return Err(AirlogicError::UnknownZone(message.zone));
        };

        info!(
            zone = %message.zone,
            feedback = %message.feedback,
            "tenant feedback received"
        );

        let mut runtime = runtime.lock().await;
        let now = Utc::now();
        runtime.feedback.record(
            category,
            &message.line_id,
            now,
            engine.config.automation.feedback_expiry_minutes,
        );
        evaluate_comfort(
            &engine,
            &self.provider,
            &self.publisher,
            &self.headers,
            &message.zone,
            &mut runtime,
        )
        .await;
        Ok(())
    }

    /// Prune expired feedback in every zone. Purely bounds memory; offsets
    /// are recomputed as part of the prune.
    pub async fn prune_feedback(&self) {
        let engine = self.engine().await;
        let now = Utc::now();
        for name in engine.registry.names() {
            if let Some(runtime) = engine.registry.get(&name) {
                let mut runtime = runtime.lock().await;
                runtime
                    .feedback
                    .prune(now, engine.config.automation.feedback_expiry_minutes);
            }
        }
    }
}

/// Full evaluation of one zone under its mutex.
async fn evaluate_zone(
    engine: &Engine,
    provider: &Arc<dyn SensorDataProvider>,
    publisher: &Arc<dyn CommandPublisher>,
    headers: &PublishHeaders,
    zone: &str,
    runtime: &Arc<Mutex<ZoneRuntime>>,
) {
    let mut runtime = runtime.lock().await;
    runtime
        .feedback
        .prune(Utc::now(), engine.config.automation.feedback_expiry_minutes);

    evaluate_comfort(engine, provider, publisher, headers, zone, &mut runtime).await;
    evaluate_ventilation(engine, provider, publisher, headers, zone, &mut runtime).await;
}

/// FCU comfort decision and publish for one zone. Caller holds the zone
/// mutex.
async fn evaluate_comfort(
    engine: &Engine,
    provider: &Arc<dyn SensorDataProvider>,
    publisher: &Arc<dyn CommandPublisher>,
    headers: &PublishHeaders,
    zone: &str,
    runtime: &mut ZoneRuntime,
) {
    let now = Utc::now();
    let devices = runtime.devices.clone();
    let lookback = engine.config.automation.lookback_minutes;

    let iaq_readings = if devices.has_iaq() {
        fetch_window(
            provider,
            &devices.iaq_device_ids,
            TimeWindow::lookback(now, lookback),
            engine.io_timeout(),
            zone,
        )
        .await
        .unwrap_or_default()
    } else {
        Vec::new()
    };
    // Without an IAQ sensor the decision needs the longer FCU mode history
    let fcu_window = if devices.has_iaq() {
        lookback
    } else {
        defaults::NO_IAQ_FCU_WINDOW_MINUTES
    };
    let fcu_readings = fetch_window(
        provider,
        &devices.fcu_device_ids,
        TimeWindow::lookback(now, fcu_window),
        engine.io_timeout(),
        zone,
    )
    .await
    .unwrap_or_default();

    let mut intents = engine
        .comfort
        .decide(zone, &devices, &iaq_readings, &fcu_readings, now);
    if intents.is_empty() {
        return;
    }

    let offset = runtime.feedback.offset();
    let jitter = runtime.next_jitter();
    apply_setpoint_policy(&mut intents, offset, jitter);
    debug!(zone, offset, jitter, count = intents.len(), "publishing FCU commands");

    for intent in &intents {
        let Some(payload) = FcuCommandPayload::from_intent(intent) else {
            continue;
        };
        publish_intent(
            engine,
            publisher,
            headers,
            &fcu_command_topic(&intent.device_id),
            &payload,
            intent,
        )
        .await;
    }
}

/// OAU ventilation decision and publish for one zone. Caller holds the
/// zone mutex.
async fn evaluate_ventilation(
    engine: &Engine,
    provider: &Arc<dyn SensorDataProvider>,
    publisher: &Arc<dyn CommandPublisher>,
    headers: &PublishHeaders,
    zone: &str,
    runtime: &mut ZoneRuntime,
) {
    let now = Utc::now();
    let devices = runtime.devices.clone();
    if devices.oau_device_ids.is_empty() {
        return;
    }

    // Provider failure holds the zone: no state change, no command. Devices
    // merely absent from a successful fetch still default to 0 ppm inside
    // the controller.
    let Some(readings) = fetch_window(
        provider,
        &devices.iaq_device_ids,
        TimeWindow::lookback(now, engine.config.automation.lookback_minutes),
        engine.io_timeout(),
        zone,
    )
    .await
    else {
        return;
    };

    let (state, intents) = engine.ventilation.decide(zone, &devices, &readings, now);
    runtime.ventilation = state;

    for intent in &intents {
        let Some(payload) = OauCommandPayload::from_intent(intent) else {
            continue;
        };
        publish_intent(
            engine,
            publisher,
            headers,
            &oau_command_topic(&intent.device_id),
            &payload,
            intent,
        )
        .await;
    }
}

/// Fetch readings with a bounded timeout. `None` means the provider failed
/// or timed out; an empty `Some` means it succeeded with no data. Callers
/// degrade either way instead of propagating.
async fn fetch_window(
    provider: &Arc<dyn SensorDataProvider>,
    device_ids: &[DeviceId],
    window: TimeWindow,
    timeout: Duration,
    zone: &str,
) -> Option<Vec<Reading>> {
    if device_ids.is_empty() {
        return Some(Vec::new());
    }
    match tokio::time::timeout(timeout, provider.fetch(device_ids, window)).await {
        Ok(Ok(readings)) => Some(readings),
        Ok(Err(err)) => {
            warn!(zone, %err, "sensor fetch failed, skipping this cycle");
            None
        }
        Err(_) => {
            warn!(zone, "sensor fetch timed out, skipping this cycle");
            None
        }
    }
}

/// Publish one intent; failures are logged per message and the rest of the
/// batch still goes out.
async fn publish_intent<P: serde::Serialize>(
    engine: &Engine,
    publisher: &Arc<dyn CommandPublisher>,
    headers: &PublishHeaders,
    topic: &str,
    payload: &P,
    intent: &CommandIntent,
) {
    let value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(err) => {
            error!(topic, %err, "failed to encode command payload");
            return;
        }
    };
    match tokio::time::timeout(engine.io_timeout(), publisher.publish(topic, value, headers)).await
    {
        Ok(Ok(())) => {
            info!(
                topic,
                mode = %intent.mode,
                setpoint = ?intent.setpoint,
                "published command"
            );
        }
        Ok(Err(err)) => {
            error!(topic, %err, "publish failed");
        }
        Err(_) => {
            error!(topic, "publish timed out");
        }
    }
}
