//! Inbound tenant-feedback payload validation.

use serde::Deserialize;
use serde_json::Value;

use airlogic_core::types::FeedbackCategory;
use airlogic_core::{AirlogicError, Result};

/// A tenant feedback message as delivered by the chat integration.
///
/// ```json
/// { "feedback": "Too Hot", "zone": "Floor 1 Creative Arena Room",
///   "lineId": "U87d0284d...", "feedbackId": "406" }
/// ```
///
/// Extra fields are ignored; any message missing `feedback`, `zone`, or
/// `lineId` is rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackMessage {
    /// Feedback label ("Too Hot" / "Too Cold")
    pub feedback: String,
    /// Zone the feedback applies to
    pub zone: String,
    /// Voter identity
    #[serde(rename = "lineId")]
    pub line_id: String,
}

impl FeedbackMessage {
    /// Validate and parse a raw payload.
    pub fn parse(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|err| AirlogicError::InvalidFeedback(err.to_string()))
    }

    /// Interpret the feedback label.
    pub fn category(&self) -> Result<FeedbackCategory> {
        FeedbackCategory::from_label(&self.feedback).ok_or_else(|| {
            AirlogicError::InvalidFeedback(format!("unknown feedback label: {}", self.feedback))
        })
    }
}
