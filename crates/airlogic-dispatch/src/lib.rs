//! Evaluation scheduling for the airlogic HVAC automation core.
//!
//! The dispatcher maps a periodic timer and the asynchronous tenant
//! feedback stream onto independent per-zone evaluation tasks, serializes
//! evaluation within each zone, bounds all collaborator I/O with timeouts,
//! and publishes the resulting FCU/OAU commands.

pub mod dispatcher;
pub mod ingest;
pub mod registry;

pub use dispatcher::{fcu_command_topic, oau_command_topic, Dispatcher};
pub use ingest::FeedbackMessage;
pub use registry::{ZoneRegistry, ZoneRuntime};
