//! Time-series helpers for zone evaluation.
//!
//! Readings arrive as sparse per-device sequences; the controllers only
//! need right-labeled fixed buckets (mean aggregation), window means, and
//! latest-value views. Nothing here assumes sample density or the absence
//! of gaps.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::types::{DeviceId, Reading};

/// Right-label a timestamp onto a fixed bucket grid.
///
/// A sample at `t` belongs to the bucket `[t0, t0 + width)` labeled by its
/// end, matching a right-labeled resample.
pub fn bucket_end(ts: DateTime<Utc>, bucket_minutes: i64) -> DateTime<Utc> {
    let width = bucket_minutes * 60;
    let secs = ts.timestamp();
    let floor = secs.div_euclid(width) * width;
    // Single-value truncation cannot be out of chrono's range here
    Utc.timestamp_opt(floor + width, 0).single().unwrap_or(ts)
}

/// Mean of a numeric metric per bucket, across all devices in `readings`.
///
/// Buckets with no numeric sample for the metric are absent from the map.
pub fn mean_by_bucket(
    readings: &[Reading],
    metric: &str,
    bucket_minutes: i64,
) -> BTreeMap<DateTime<Utc>, f64> {
    let mut sums: BTreeMap<DateTime<Utc>, (f64, u32)> = BTreeMap::new();
    for reading in readings {
        if let Some(value) = reading.metric_f64(metric) {
            let entry = sums
                .entry(bucket_end(reading.timestamp, bucket_minutes))
                .or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(bucket, (sum, count))| (bucket, sum / count as f64))
        .collect()
}

/// Mean of a numeric metric over the whole window.
pub fn window_mean(readings: &[Reading], metric: &str) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0u32;
    for reading in readings {
        if let Some(value) = reading.metric_f64(metric) {
            sum += value;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}

/// Latest reading per device, by timestamp.
pub fn latest_per_device(readings: &[Reading]) -> HashMap<&str, &Reading> {
    let mut latest: HashMap<&str, &Reading> = HashMap::new();
    for reading in readings {
        match latest.get(reading.device_id.as_str()) {
            Some(existing) if existing.timestamp >= reading.timestamp => {}
            _ => {
                latest.insert(reading.device_id.as_str(), reading);
            }
        }
    }
    latest
}

/// All values of a metric grouped per device, in input order.
pub fn metric_values_per_device<'a>(
    readings: &'a [Reading],
    metric: &str,
) -> HashMap<&'a DeviceId, Vec<&'a serde_json::Value>> {
    let mut grouped: HashMap<&DeviceId, Vec<&serde_json::Value>> = HashMap::new();
    for reading in readings {
        if let Some(value) = reading.metrics.get(metric) {
            grouped.entry(&reading.device_id).or_default().push(value);
        }
    }
    grouped
}
