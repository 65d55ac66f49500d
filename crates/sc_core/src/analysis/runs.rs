//! # Sustained-Run Detector
//!
//! Selects high-speed frames and groups them into contiguous runs.
//!
//! ## Algorithm
//! 1. Keep samples with speed >= threshold (5.0 m/s by default)
//! 2. Group kept samples per entity; a frame gap larger than
//!    `max_frame_gap` starts a new run
//! 3. Optional: drop runs whose last-minus-first timestamp is shorter
//!    than the minimum duration

use std::ops::Range;

use crate::config::AnalysisConfig;
use crate::error::{CoreError, Result};
use crate::models::TrackingSample;

/// Default running threshold: 5.0 m/s (18 km/h)
pub const RUN_SPEED_THRESHOLD_MPS: f64 = 5.0;

/// Thresholds of the run detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunDetectorParams {
    pub speed_threshold_mps: f64,
    pub min_duration_s: Option<f64>,
    pub max_frame_gap: u32,
}

impl Default for RunDetectorParams {
    fn default() -> Self {
        Self {
            speed_threshold_mps: RUN_SPEED_THRESHOLD_MPS,
            min_duration_s: None,
            max_frame_gap: 1,
        }
    }
}

impl From<&AnalysisConfig> for RunDetectorParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            speed_threshold_mps: config.speed_threshold_mps,
            min_duration_s: config.min_run_duration_s,
            max_frame_gap: config.max_frame_gap,
        }
    }
}

/// A maximal stretch of contiguous high-speed frames of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSegment {
    pub entity_id: u32,
    /// 1-based run number within the entity
    pub run_index: u32,
    pub samples: Vec<TrackingSample>,
}

impl RunSegment {
    pub fn start_frame(&self) -> u32 {
        self.samples.first().map(|s| s.frame).unwrap_or(0)
    }

    pub fn end_frame(&self) -> u32 {
        self.samples.last().map(|s| s.frame).unwrap_or(0)
    }

    /// Wall-clock duration: last timestamp minus first timestamp.
    pub fn duration_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp_s - first.timestamp_s,
            _ => 0.0,
        }
    }

    pub fn max_speed(&self) -> f64 {
        self.samples
            .iter()
            .filter_map(|s| s.speed)
            .fold(0.0f64, f64::max)
    }
}

/// Split a slice sorted by (entity, frame) into maximal contiguous ranges.
///
/// A new range starts at every entity change and wherever the frame gap to
/// the previous item exceeds `max_frame_gap`.
pub(crate) fn contiguous_ranges<T>(
    items: &[T],
    max_frame_gap: u32,
    key: impl Fn(&T) -> (u32, u32),
) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 1..items.len() {
        let (prev_entity, prev_frame) = key(&items[i - 1]);
        let (entity, frame) = key(&items[i]);
        if entity != prev_entity || frame.saturating_sub(prev_frame) > max_frame_gap {
            ranges.push(start..i);
            start = i;
        }
    }
    if !items.is_empty() {
        ranges.push(start..items.len());
    }
    ranges
}

/// Ensure the speed column exists on every row.
fn require_speed(samples: &[TrackingSample]) -> Result<()> {
    if samples.iter().any(|s| s.speed.is_none()) {
        return Err(CoreError::MissingColumn { column: "speed" });
    }
    Ok(())
}

/// Detect sustained runs as segments.
///
/// # Errors
/// `CoreError::MissingColumn` when any sample has no speed; run
/// `analysis::kinematics::compute_kinematics` first.
pub fn detect_run_segments(
    samples: &[TrackingSample],
    params: &RunDetectorParams,
) -> Result<Vec<RunSegment>> {
    require_speed(samples)?;

    let mut fast: Vec<&TrackingSample> = samples
        .iter()
        .filter(|s| s.speed.unwrap_or(0.0) >= params.speed_threshold_mps)
        .collect();
    fast.sort_by_key(|s| (s.entity_id, s.frame));

    let mut segments = Vec::new();
    let mut run_index = 0u32;
    let mut last_entity = None;
    for range in contiguous_ranges(&fast, params.max_frame_gap, |s| (s.entity_id, s.frame)) {
        let entity_id = fast[range.start].entity_id;
        if last_entity != Some(entity_id) {
            run_index = 0;
            last_entity = Some(entity_id);
        }
        run_index += 1;

        let segment = RunSegment {
            entity_id,
            run_index,
            samples: fast[range].iter().map(|&s| s.clone()).collect(),
        };
        if let Some(min) = params.min_duration_s {
            if segment.duration_s() < min {
                continue;
            }
        }
        segments.push(segment);
    }

    log::debug!(
        "run detection: {} frames >= {:.1} m/s, {} runs kept",
        fast.len(),
        params.speed_threshold_mps,
        segments.len()
    );

    Ok(segments)
}

/// Detect sustained runs as a flat table of qualifying samples, sorted by
/// (entity_id, frame).
pub fn detect_runs(samples: &[TrackingSample], params: &RunDetectorParams) -> Result<Vec<TrackingSample>> {
    Ok(detect_run_segments(samples, params)?
        .into_iter()
        .flat_map(|segment| segment.samples)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed_series(entity_id: u32, first_frame: u32, speeds: &[f64]) -> Vec<TrackingSample> {
        speeds
            .iter()
            .enumerate()
            .map(|(i, &speed)| {
                let frame = first_frame + i as u32;
                TrackingSample::new(frame, frame as f64 / 10.0, 1, entity_id, 0.0, 0.0)
                    .with_speed(speed)
            })
            .collect()
    }

    #[test]
    fn test_threshold_selects_fast_frames() {
        let samples = speed_series(4, 0, &[0.0, 3.0, 6.0, 7.0, 2.0]);
        let params = RunDetectorParams::default();

        let runs = detect_runs(&samples, &params).unwrap();
        let frames: Vec<u32> = runs.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![2, 3]);

        let segments = detect_run_segments(&samples, &params).unwrap();
        assert_eq!(segments.len(), 1, "frames 2 and 3 form one run");
        assert_eq!(segments[0].samples.len(), 2);
        assert_eq!(segments[0].run_index, 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let samples = speed_series(1, 0, &[5.0, 4.999]);
        let runs = detect_runs(&samples, &RunDetectorParams::default()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].frame, 0);
    }

    #[test]
    fn test_gap_starts_new_run() {
        let samples = speed_series(1, 10, &[6.0, 6.0, 1.0, 6.0, 6.0, 6.0]);
        let segments = detect_run_segments(&samples, &RunDetectorParams::default()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start_frame(), segments[0].end_frame()), (10, 11));
        assert_eq!((segments[1].start_frame(), segments[1].end_frame()), (13, 15));
        assert_eq!(segments[1].run_index, 2);
    }

    #[test]
    fn test_runs_never_span_entities() {
        let mut samples = speed_series(1, 0, &[6.0, 6.0]);
        samples.extend(speed_series(2, 2, &[6.0, 6.0]));
        let segments = detect_run_segments(&samples, &RunDetectorParams::default()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].entity_id, 1);
        assert_eq!(segments[1].entity_id, 2);
        assert_eq!(segments[1].run_index, 1, "run numbering restarts per entity");
    }

    #[test]
    fn test_min_duration_gate() {
        // 5 frames at 10 Hz = 0.4 s, 15 frames = 1.4 s
        let mut samples = speed_series(1, 0, &[6.0; 5]);
        samples.extend(speed_series(1, 10, &[6.0; 15]));

        let params = RunDetectorParams {
            min_duration_s: Some(1.0),
            ..RunDetectorParams::default()
        };
        let segments = detect_run_segments(&samples, &params).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_frame(), 10);
        assert_eq!(segments[0].run_index, 2, "run ids keep their pre-filter numbering");
        assert!(segments[0].duration_s() >= 1.0);

        let flat = detect_runs(&samples, &params).unwrap();
        assert_eq!(flat.len(), 15);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut samples = speed_series(2, 0, &[6.0, 6.0]);
        samples.extend(speed_series(1, 0, &[6.0]));
        samples.reverse();

        let runs = detect_runs(&samples, &RunDetectorParams::default()).unwrap();
        let keys: Vec<(u32, u32)> = runs.iter().map(|s| (s.entity_id, s.frame)).collect();
        assert_eq!(keys, vec![(1, 0), (2, 0), (2, 1)]);
    }

    #[test]
    fn test_missing_speed_is_an_error() {
        let samples = vec![TrackingSample::new(1, 0.1, 1, 1, 0.0, 0.0)];
        let err = detect_runs(&samples, &RunDetectorParams::default()).unwrap_err();
        assert!(matches!(err, CoreError::MissingColumn { column: "speed" }));
    }

    #[test]
    fn test_contiguous_ranges_with_wider_gap() {
        let items = vec![(1u32, 1u32), (1, 3), (1, 6), (2, 7)];
        let ranges = contiguous_ranges(&items, 2, |&(e, f)| (e, f));
        assert_eq!(ranges, vec![0..2, 2..3, 3..4]);
        assert!(contiguous_ranges::<(u32, u32)>(&[], 1, |&(e, f)| (e, f)).is_empty());
    }
}
