//! Per-zone sliding window of tenant comfort votes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use airlogic_core::types::FeedbackCategory;

/// One tenant vote. The category is implied by which sequence holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackEvent {
    /// When the vote was received
    pub timestamp: DateTime<Utc>,
    /// Identity of the voter (chat line ID)
    pub voter_id: String,
}

/// Sliding window of votes for one zone, with the derived setpoint offset.
///
/// Invariants: every stored event is younger than the expiry passed to the
/// last `prune`/`record` call, and at most one unexpired event exists per
/// `(category, voter)` pair. The offset is recomputed on every mutation and
/// is always in `{-1, 0, +1}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackWindow {
    too_hot: Vec<FeedbackEvent>,
    too_cold: Vec<FeedbackEvent>,
    offset: i8,
}

impl FeedbackWindow {
    /// Empty window with a zero offset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current majority offset: hot majority cools (-1), cold majority
    /// warms (+1), tie holds (0).
    pub fn offset(&self) -> i8 {
        self.offset
    }

    /// Number of unexpired votes in a category.
    pub fn len(&self, category: FeedbackCategory) -> usize {
        self.votes(category).len()
    }

    /// Whether the window holds no votes at all.
    pub fn is_empty(&self) -> bool {
        self.too_hot.is_empty() && self.too_cold.is_empty()
    }

    /// Drop votes older than `expiry_minutes` and recompute the offset.
    pub fn prune(&mut self, now: DateTime<Utc>, expiry_minutes: i64) {
        let cutoff = now - Duration::minutes(expiry_minutes);
        self.too_hot.retain(|event| event.timestamp >= cutoff);
        self.too_cold.retain(|event| event.timestamp >= cutoff);
        self.recompute_offset();
    }

    /// Record a vote: prune first, then append unless the same voter
    /// already has an unexpired vote in the category (duplicate votes are
    /// ignored, not replaced). Recomputes the offset either way.
    pub fn record(
        &mut self,
        category: FeedbackCategory,
        voter_id: &str,
        now: DateTime<Utc>,
        expiry_minutes: i64,
    ) {
        self.prune(now, expiry_minutes);

        let votes = self.votes_mut(category);
        if votes.iter().any(|event| event.voter_id == voter_id) {
            debug!(?category, voter_id, "duplicate vote ignored");
        } else {
            votes.push(FeedbackEvent {
                timestamp: now,
                voter_id: voter_id.to_string(),
            });
        }
        self.recompute_offset();
    }

    fn votes(&self, category: FeedbackCategory) -> &Vec<FeedbackEvent> {
        match category {
            FeedbackCategory::TooHot => &self.too_hot,
            FeedbackCategory::TooCold => &self.too_cold,
        }
    }

    fn votes_mut(&mut self, category: FeedbackCategory) -> &mut Vec<FeedbackEvent> {
        match category {
            FeedbackCategory::TooHot => &mut self.too_hot,
            FeedbackCategory::TooCold => &mut self.too_cold,
        }
    }

    fn recompute_offset(&mut self) {
        self.offset = match self.too_hot.len().cmp(&self.too_cold.len()) {
            std::cmp::Ordering::Greater => -1,
            std::cmp::Ordering::Less => 1,
            std::cmp::Ordering::Equal => 0,
        };
    }
}
