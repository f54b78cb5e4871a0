//! Thermal comfort model and FCU decision logic.
//!
//! Two layers:
//!
//! - [`model`] — pure adaptive-PMV functions and the setpoint inversion
//!   scan.
//! - [`controller`] — the per-zone FCU decision engine composing the model
//!   with the humidity override policy, plus the batch setpoint policy
//!   (floor, tenant offset, jitter).

pub mod controller;
pub mod model;

pub use controller::{apply_setpoint_policy, ComfortBand, ComfortZoneController};
pub use model::{adaptive_pmv, find_target_temperature, pmv};
