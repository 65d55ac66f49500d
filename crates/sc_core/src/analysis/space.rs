//! # Space-Creation Measurer
//!
//! Credits an off-ball run with the controlled area it opens up for the
//! team in possession, measured between the run frame and a lookahead
//! frame.
//!
//! ## Algorithm
//! 1. Detect sustained-run frames (`analysis::runs`)
//! 2. Keep frames where the runner's own team has the ball and the runner
//!    is not the ball carrier
//! 3. gain = area(target, frame + lookahead) - area(target, frame)
//! 4. Policy: ball carrier only (floored at 0) or all teammates (sum of
//!    positive gains)

use serde::{Deserialize, Serialize};

use super::runs::{detect_runs, RunDetectorParams};
use super::tessellation::{AreaCache, ControlledAreaMap, TessellationStats};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{PitchDimensions, PossessionIndex, TeamRosters, TeamSide, TrackingSample};

/// Whose area gain counts as space created by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceCreationPolicy {
    /// Only the ball carrier's gain, floored at zero
    #[default]
    BallCarrier,
    /// Sum of strictly positive gains over all teammates of the runner
    AllTeammates,
}

/// Space created at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceGain {
    /// Square meters gained (never negative)
    pub value: f64,
    /// Number of players whose area grew
    pub beneficiaries: u32,
}

/// Raw area change of `target`; `None` when either map lacks the target.
pub fn area_gain(before: &ControlledAreaMap, after: &ControlledAreaMap, target: u32) -> Option<f64> {
    Some(after.get(&target)? - before.get(&target)?)
}

/// Single-target policy: max(0, gain), 0 when the target is not measurable.
pub fn single_target_gain(before: &ControlledAreaMap, after: &ControlledAreaMap, target: u32) -> SpaceGain {
    match area_gain(before, after, target) {
        Some(gain) if gain > 0.0 => SpaceGain {
            value: gain,
            beneficiaries: 1,
        },
        _ => SpaceGain::default(),
    }
}

/// Multi-target policy: each target is measured independently and only
/// strictly positive gains are summed.
pub fn multi_target_gain(
    before: &ControlledAreaMap,
    after: &ControlledAreaMap,
    targets: impl IntoIterator<Item = u32>,
) -> SpaceGain {
    targets
        .into_iter()
        .filter_map(|target| area_gain(before, after, target))
        .filter(|&gain| gain > 0.0)
        .fold(SpaceGain::default(), |acc, gain| SpaceGain {
            value: acc.value + gain,
            beneficiaries: acc.beneficiaries + 1,
        })
}

/// Space created for `target` by a run from `start_frame` to `end_frame`.
///
/// Returns 0 when either frame cannot be tessellated or the target is
/// missing from it.
pub fn measure_space_creation(cache: &mut AreaCache<'_>, start_frame: u32, end_frame: u32, target: u32) -> f64 {
    let (before, after) = cache.pair(start_frame, end_frame);
    single_target_gain(before, after, target).value
}

/// Space created for every teammate in `targets` except the runner.
pub fn measure_team_space_creation(
    cache: &mut AreaCache<'_>,
    runner_id: u32,
    start_frame: u32,
    end_frame: u32,
    targets: &[u32],
) -> SpaceGain {
    let (before, after) = cache.pair(start_frame, end_frame);
    multi_target_gain(before, after, targets.iter().copied().filter(|&id| id != runner_id))
}

/// Why a run frame is not measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Runner is on neither roster
    UnknownRunnerTeam,
    /// No possession record, or possessor unresolved
    NoPossession,
    /// The runner has the ball
    RunnerInPossession,
    /// Possessor is on neither roster
    PossessorNotOnTeam,
    /// The other team has the ball
    OpponentPossession,
}

/// A run frame that passed the eligibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub team: TeamSide,
    pub possessor_id: u32,
}

/// Decide whether the run of `runner_id` at `frame` is measured.
pub fn check_eligibility(
    runner_id: u32,
    frame: u32,
    rosters: &TeamRosters,
    possession: &PossessionIndex,
) -> std::result::Result<Eligibility, SkipReason> {
    let team = rosters.team_of(runner_id).ok_or(SkipReason::UnknownRunnerTeam)?;
    let possessor_id = possession.possessor(frame).ok_or(SkipReason::NoPossession)?;
    if possessor_id == runner_id {
        return Err(SkipReason::RunnerInPossession);
    }
    let possessor_team = rosters.team_of(possessor_id).ok_or(SkipReason::PossessorNotOnTeam)?;
    if possessor_team != team {
        return Err(SkipReason::OpponentPossession);
    }
    Ok(Eligibility { team, possessor_id })
}

/// One measured off-ball run frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFrameRecord {
    pub frame: u32,
    pub period: u8,
    pub entity_id: u32,
    pub possessor_id: u32,
    pub team: TeamSide,
    pub speed: f64,
    pub space_created: f64,
    pub beneficiaries: u32,
    pub detected: bool,
    pub x: f64,
    pub y: f64,
}

/// Counters of one `analyze_offball_runs` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffBallRunStats {
    pub run_frames: u32,
    pub unknown_runner_team: u32,
    pub no_possession: u32,
    pub runner_in_possession: u32,
    pub possessor_not_on_team: u32,
    pub opponent_possession: u32,
    pub measured: u32,
    pub emitted: u32,
    pub tessellation: TessellationStats,
}

impl OffBallRunStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::UnknownRunnerTeam => self.unknown_runner_team += 1,
            SkipReason::NoPossession => self.no_possession += 1,
            SkipReason::RunnerInPossession => self.runner_in_possession += 1,
            SkipReason::PossessorNotOnTeam => self.possessor_not_on_team += 1,
            SkipReason::OpponentPossession => self.opponent_possession += 1,
        }
    }
}

/// Detect off-ball runs during own-team possession and measure the space
/// each run frame creates.
///
/// # Arguments
/// * `kinematics` - Tracking table of one period with speeds
/// * `possession` - Possession lookup for the same period
/// * `rosters` - Entity → team map
/// * `pitch` - Pitch used for the tessellation
/// * `config` - Thresholds, lookahead and policy
///
/// # Errors
/// `CoreError::MissingColumn` when the table has no speeds.
pub fn analyze_offball_runs(
    kinematics: &[TrackingSample],
    possession: &PossessionIndex,
    rosters: &TeamRosters,
    pitch: PitchDimensions,
    config: &AnalysisConfig,
) -> Result<(Vec<RunFrameRecord>, OffBallRunStats)> {
    let runs = detect_runs(kinematics, &RunDetectorParams::from(config))?;
    let mut cache = AreaCache::new(kinematics, pitch, config.min_entities);
    let mut stats = OffBallRunStats {
        run_frames: runs.len() as u32,
        ..OffBallRunStats::default()
    };

    let home: Vec<u32> = rosters.teammates(TeamSide::Home).collect();
    let away: Vec<u32> = rosters.teammates(TeamSide::Away).collect();

    let mut records = Vec::new();
    for run in &runs {
        let eligible = match check_eligibility(run.entity_id, run.frame, rosters, possession) {
            Ok(eligible) => eligible,
            Err(reason) => {
                stats.record_skip(reason);
                continue;
            }
        };
        stats.measured += 1;

        let end_frame = run.frame.saturating_add(config.lookahead_frames);
        let gain = match config.policy {
            SpaceCreationPolicy::BallCarrier => {
                let (before, after) = cache.pair(run.frame, end_frame);
                single_target_gain(before, after, eligible.possessor_id)
            }
            SpaceCreationPolicy::AllTeammates => {
                let teammates = match eligible.team {
                    TeamSide::Home => &home,
                    TeamSide::Away => &away,
                };
                measure_team_space_creation(&mut cache, run.entity_id, run.frame, end_frame, teammates)
            }
        };

        if gain.value <= 0.0 && !config.emit_non_positive {
            continue;
        }
        records.push(RunFrameRecord {
            frame: run.frame,
            period: run.period,
            entity_id: run.entity_id,
            possessor_id: eligible.possessor_id,
            team: eligible.team,
            speed: run.speed.unwrap_or(0.0),
            space_created: gain.value,
            beneficiaries: gain.beneficiaries,
            detected: run.detected,
            x: run.x,
            y: run.y,
        });
    }

    stats.emitted = records.len() as u32;
    stats.tessellation = cache.stats();
    log::info!(
        "analyzed {} run frames: {} measured, {} off-ball runs emitted",
        stats.run_frames,
        stats.measured,
        stats.emitted
    );

    Ok((records, stats))
}
