//! External collaborator seams.
//!
//! The core never talks to a database or a message bus directly. It pulls
//! readings through [`SensorDataProvider`] and emits commands through
//! [`CommandPublisher`]; both are implemented by the host.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{DeviceId, Reading};

/// Half-open time window `[start, end)` for telemetry queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending at `end` covering the previous `minutes`.
    pub fn lookback(end: DateTime<Utc>, minutes: i64) -> Self {
        Self {
            start: end - chrono::Duration::minutes(minutes),
            end,
        }
    }

    /// Whether a timestamp falls inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Source of recent device telemetry.
///
/// Implementations must return readings sorted by timestamp ascending per
/// device. Absence of data for a device is represented by omission, never
/// by an error; provider-level failures surface as `Err` and are treated
/// as "no data" by the callers.
#[async_trait]
pub trait SensorDataProvider: Send + Sync {
    /// Fetch readings for the given devices inside the window.
    async fn fetch(&self, device_ids: &[DeviceId], window: TimeWindow) -> Result<Vec<Reading>>;
}

/// Headers attached to every published command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishHeaders {
    /// Identity of the publishing component
    #[serde(rename = "requesterID")]
    pub requester_id: String,
    /// Always "command"
    #[serde(rename = "message_type")]
    pub message_type: String,
}

impl PublishHeaders {
    /// Command headers for the given requester identity.
    pub fn command(requester_id: impl Into<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
            message_type: "command".to_string(),
        }
    }
}

/// Sink for outbound command messages.
///
/// At-least-once, fire-and-forget from the core's perspective: publish
/// failures are logged by the caller and never retried here (retry policy
/// belongs to the transport).
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Publish one command payload to a topic.
    async fn publish(&self, topic: &str, payload: Value, headers: &PublishHeaders) -> Result<()>;
}
