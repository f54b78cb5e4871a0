//! Tenant feedback aggregation.
//!
//! Each zone owns a [`FeedbackWindow`]: two expiring sequences of votes
//! (too hot / too cold) and the majority offset derived from them. The
//! window is a plain owned record; the dispatcher holds it inside the
//! per-zone exclusive evaluation scope, so no locking happens here.

pub mod window;

pub use window::{FeedbackEvent, FeedbackWindow};
