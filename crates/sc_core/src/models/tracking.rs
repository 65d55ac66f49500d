//! # Tracking Samples
//!
//! Flat per-frame, per-entity position table as handed over by the ingestion
//! layer. One row per (frame, entity). `speed` stays `None` until the
//! kinematics estimator has run.

use chrono::{NaiveTime, Timelike};
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One tracked entity at one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSample {
    /// Frame number, unique within a match
    pub frame: u32,
    /// Seconds since the start of the period
    pub timestamp_s: f64,
    /// Match period (1 or 2)
    pub period: u8,
    /// Tracked player id
    pub entity_id: u32,
    /// Pitch x in meters (origin at center spot)
    pub x: f64,
    /// Pitch y in meters (origin at center spot)
    pub y: f64,
    /// Whether the position was observed (false = extrapolated)
    pub detected: bool,
    /// Speed in m/s, filled by `analysis::kinematics`
    #[serde(default)]
    pub speed: Option<f64>,
}

impl TrackingSample {
    pub fn new(frame: u32, timestamp_s: f64, period: u8, entity_id: u32, x: f64, y: f64) -> Self {
        Self {
            frame,
            timestamp_s,
            period,
            entity_id,
            x,
            y,
            detected: true,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Ball position at one frame. Coordinates are optional because the ball
/// is frequently lost by the tracking provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSample {
    pub frame: u32,
    pub timestamp_s: f64,
    pub period: u8,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl BallSample {
    pub fn position(&self) -> Option<Point2<f64>> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point2::new(x, y)),
            _ => None,
        }
    }
}

/// Parse a period-relative `"H:MM:SS.fff"` timestamp into seconds.
pub fn parse_timestamp(value: &str) -> Result<f64> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M:%S%.f").map_err(|_| {
        CoreError::InvalidTimestamp {
            value: value.to_string(),
        }
    })?;
    Ok(time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1_000_000_000.0)
}

/// Row indices grouped by frame number, for repeated per-frame lookups.
#[derive(Debug, Clone, Default)]
pub struct FrameIndex {
    rows: FxHashMap<u32, Vec<usize>>,
}

impl FrameIndex {
    pub fn build(samples: &[TrackingSample]) -> Self {
        let mut rows: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
        for (idx, sample) in samples.iter().enumerate() {
            rows.entry(sample.frame).or_default().push(idx);
        }
        Self { rows }
    }

    /// Samples recorded at `frame`, in table order. Empty for unknown frames.
    pub fn frame<'a>(
        &'a self,
        samples: &'a [TrackingSample],
        frame: u32,
    ) -> impl Iterator<Item = &'a TrackingSample> + 'a {
        self.rows
            .get(&frame)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&idx| &samples[idx])
    }

    pub fn contains(&self, frame: u32) -> bool {
        self.rows.contains_key(&frame)
    }

    pub fn frame_count(&self) -> usize {
        self.rows.len()
    }
}

/// Samples belonging to one period.
pub fn filter_period(samples: &[TrackingSample], period: u8) -> Vec<TrackingSample> {
    samples
        .iter()
        .filter(|s| s.period == period)
        .cloned()
        .collect()
}
