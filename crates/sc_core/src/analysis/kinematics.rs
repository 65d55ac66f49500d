//! # Kinematics Estimator
//!
//! Derives per-sample speed from consecutive positions of the same entity.
//!
//! ## Algorithm
//! 1. Sort samples by (entity_id, frame)
//! 2. For each sample, take the displacement and elapsed time to the
//!    previous sample of the same entity
//! 3. speed = distance / elapsed; the first sample of an entity and any
//!    non-positive elapsed time give 0

use crate::models::TrackingSample;

/// Calculate speed from position delta and time delta.
///
/// Returns 0 for a zero, negative or non-finite elapsed time (e.g. a period
/// boundary between the two samples).
#[inline]
pub fn speed_from_positions(pos0: (f64, f64), pos1: (f64, f64), dt_s: f64) -> f64 {
    if !(dt_s > 0.0) || !dt_s.is_finite() {
        return 0.0;
    }
    let dx = pos1.0 - pos0.0;
    let dy = pos1.1 - pos0.1;
    let speed = (dx * dx + dy * dy).sqrt() / dt_s;
    if speed.is_finite() {
        speed
    } else {
        0.0
    }
}

/// Sort a tracking table by (entity_id, frame), keeping table order for ties.
pub fn sort_by_entity_frame(samples: &mut [TrackingSample]) {
    samples.sort_by_key(|s| (s.entity_id, s.frame));
}

/// Annotate every sample with its speed in m/s.
///
/// # Arguments
/// * `samples` - Tracking table in any order
/// * `entity_id` - Restrict the output to one entity
///
/// # Returns
/// New table sorted by (entity_id, frame) with `speed` set on every row.
pub fn compute_kinematics(samples: &[TrackingSample], entity_id: Option<u32>) -> Vec<TrackingSample> {
    let mut out: Vec<TrackingSample> = match entity_id {
        Some(id) => samples.iter().filter(|s| s.entity_id == id).cloned().collect(),
        None => samples.to_vec(),
    };
    sort_by_entity_frame(&mut out);

    let mut prev: Option<(u32, (f64, f64), f64)> = None;
    for sample in out.iter_mut() {
        let speed = match prev {
            Some((prev_id, prev_pos, prev_ts)) if prev_id == sample.entity_id => {
                speed_from_positions(prev_pos, (sample.x, sample.y), sample.timestamp_s - prev_ts)
            }
            _ => 0.0,
        };
        prev = Some((sample.entity_id, (sample.x, sample.y), sample.timestamp_s));
        sample.speed = Some(speed);
    }

    out
}
