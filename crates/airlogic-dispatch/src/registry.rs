//! Per-zone runtime state and the zone registry.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use airlogic_core::config::{defaults, ZoneDevices};
use airlogic_core::types::{VentilationState, ZoneName};
use airlogic_feedback::FeedbackWindow;

/// Mutable per-zone state, owned by the registry and accessed only under
/// the zone's mutex: feedback-triggered and periodic evaluations of the
/// same zone never interleave.
#[derive(Debug)]
pub struct ZoneRuntime {
    /// Device IDs mapped to this zone
    pub devices: ZoneDevices,
    /// Sliding tenant-vote window and derived offset
    pub feedback: FeedbackWindow,
    /// Last evaluated ventilation state (Indeterminate until a real
    /// transition fires)
    pub ventilation: VentilationState,
    /// Which of the two jitter values the next evaluation uses
    jitter_flip: bool,
}

impl ZoneRuntime {
    /// Fresh runtime for a configured zone.
    pub fn new(devices: ZoneDevices) -> Self {
        Self {
            devices,
            feedback: FeedbackWindow::new(),
            ventilation: VentilationState::Indeterminate,
            jitter_flip: false,
        }
    }

    /// The jitter for this evaluation; alternates 0.1/0.2 on every call so
    /// two consecutive evaluations never publish the same literal setpoint.
    pub fn next_jitter(&mut self) -> f64 {
        let jitter = defaults::JITTER_OPTIONS[usize::from(self.jitter_flip)];
        self.jitter_flip = !self.jitter_flip;
        jitter
    }
}

/// Registry of all configured zones.
///
/// Created at configuration load and replaced wholesale on reconfiguration;
/// zones are never destroyed during a run.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: DashMap<ZoneName, Arc<Mutex<ZoneRuntime>>>,
}

impl ZoneRegistry {
    /// Build a registry from the configured zone mapping.
    pub fn from_config(zones: &HashMap<ZoneName, ZoneDevices>) -> Self {
        let registry = Self::default();
        for (name, devices) in zones {
            registry
                .zones
                .insert(name.clone(), Arc::new(Mutex::new(ZoneRuntime::new(devices.clone()))));
        }
        registry
    }

    /// Look up a zone's runtime cell.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<ZoneRuntime>>> {
        self.zones.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Names of all configured zones.
    pub fn names(&self) -> Vec<ZoneName> {
        self.zones.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of configured zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether no zones are configured.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
