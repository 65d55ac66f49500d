//! # Trajectory Grouper
//!
//! Collapses consecutive run-frame records of one entity into a single
//! start-to-end summary per physical run.
//!
//! Space created over a trajectory is the delta between its last and first
//! record, not a sum: consecutive frames share most of their lookahead
//! window and summing would count the same space many times.

use serde::{Deserialize, Serialize};

use super::runs::contiguous_ranges;
use super::space::RunFrameRecord;
use crate::models::{AttackDirection, TeamSide};

/// Stable per-entity run identifier, displayed as `"{entity_id}_{sequence}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId {
    pub entity_id: u32,
    /// 1-based run number within the entity
    pub sequence: u32,
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.entity_id, self.sequence)
    }
}

/// One physical run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub run_id: RunId,
    pub entity_id: u32,
    pub team: TeamSide,
    pub start_frame: u32,
    pub end_frame: u32,
    /// Number of run frames
    pub duration_frames: u32,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub max_speed: f64,
    pub total_space_created: f64,
    pub match_id: Option<String>,
    pub period: Option<u8>,
}

impl Trajectory {
    pub fn duration_seconds(&self, frame_rate_hz: f64) -> f64 {
        self.duration_frames as f64 / frame_rate_hz
    }

    /// Flip x so the run reads as attacking left to right.
    pub fn mirror_x(&mut self) {
        self.start_x = -self.start_x;
        self.end_x = -self.end_x;
    }
}

/// Group run-frame records into trajectories.
///
/// Records are sorted by (entity_id, frame); a frame gap larger than
/// `max_frame_gap` starts a new run. Single-frame runs are kept.
pub fn group_runs_to_trajectories(records: &[RunFrameRecord], max_frame_gap: u32) -> Vec<Trajectory> {
    let mut sorted: Vec<&RunFrameRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.entity_id, r.frame));

    let mut trajectories = Vec::new();
    let mut sequence = 0u32;
    let mut last_entity = None;
    for range in contiguous_ranges(&sorted, max_frame_gap, |r| (r.entity_id, r.frame)) {
        let run = &sorted[range];
        let (start, end) = (run[0], run[run.len() - 1]);

        if last_entity != Some(start.entity_id) {
            sequence = 0;
            last_entity = Some(start.entity_id);
        }
        sequence += 1;

        trajectories.push(Trajectory {
            run_id: RunId {
                entity_id: start.entity_id,
                sequence,
            },
            entity_id: start.entity_id,
            team: start.team,
            start_frame: start.frame,
            end_frame: end.frame,
            duration_frames: run.len() as u32,
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            max_speed: run.iter().map(|r| r.speed).fold(0.0f64, f64::max),
            total_space_created: end.space_created - start.space_created,
            match_id: None,
            period: Some(start.period),
        });
    }

    trajectories
}

/// Express every trajectory as attacking left to right.
///
/// `home_direction` is the home team's attack direction in the period the
/// trajectories come from. Home attacking right-to-left mirrors home runs,
/// otherwise away runs are mirrored. Without a direction nothing changes.
pub fn normalize_attack_direction(trajectories: &mut [Trajectory], home_direction: Option<AttackDirection>) {
    let Some(home_direction) = home_direction else {
        return;
    };
    let mirrored = match home_direction {
        AttackDirection::RightToLeft => TeamSide::Home,
        AttackDirection::LeftToRight => TeamSide::Away,
    };
    for trajectory in trajectories.iter_mut().filter(|t| t.team == mirrored) {
        trajectory.mirror_x();
    }
}
