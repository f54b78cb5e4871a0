//! CO2-driven ventilation control.
//!
//! A per-zone hysteresis state machine over the latest CO2 reading of every
//! IAQ device mapped to the zone: all below the off threshold turns the
//! outdoor-air units off, any above the on threshold turns them on, and the
//! band in between is Indeterminate — no command, the previous real command
//! keeps holding downstream.

pub mod controller;

pub use controller::VentilationController;
