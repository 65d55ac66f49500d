//! # Match-Set Orchestrator
//!
//! Runs the full off-ball run analysis over periods, matches and batches.
//!
//! ## Algorithm (per period)
//! 1. Build rosters and the possession lookup from the match possession table
//! 2. Skip the period when its tracking table is empty or a roster is empty
//! 3. Kinematics → run detection → eligibility → space creation
//! 4. Group run frames into trajectories
//! 5. Normalize x so every team attacks left to right
//!
//! A batch never aborts on one match: load or analysis failures are
//! logged and reported in [`BatchReport::failures`].

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::kinematics::compute_kinematics;
use crate::analysis::space::{analyze_offball_runs, OffBallRunStats, RunFrameRecord};
use crate::analysis::trajectory::{group_runs_to_trajectories, normalize_attack_direction, Trajectory};
use crate::config::AnalysisConfig;
use crate::error::{CoreError, Result};
use crate::models::{
    filter_period, AttackDirection, MatchData, MatchMetadata, PossessionIndex, TeamRosters,
};

/// Periods analysed for every match.
pub const MATCH_PERIODS: [u8; 2] = [1, 2];

/// Result of one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodAnalysis {
    pub match_id: String,
    pub period: u8,
    pub records: Vec<RunFrameRecord>,
    pub trajectories: Vec<Trajectory>,
    pub stats: OffBallRunStats,
    /// Home attack direction applied during normalization
    pub home_direction: Option<AttackDirection>,
}

impl PeriodAnalysis {
    fn empty(match_id: &str, period: u8) -> Self {
        Self {
            match_id: match_id.to_string(),
            period,
            ..Self::default()
        }
    }
}

/// Result of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub metadata: MatchMetadata,
    pub periods: Vec<PeriodAnalysis>,
}

impl MatchAnalysis {
    pub fn match_id(&self) -> &str {
        &self.metadata.match_id
    }

    pub fn trajectories(&self) -> impl Iterator<Item = &Trajectory> {
        self.periods.iter().flat_map(|p| p.trajectories.iter())
    }

    pub fn records(&self) -> impl Iterator<Item = &RunFrameRecord> {
        self.periods.iter().flat_map(|p| p.records.iter())
    }
}

/// Analyse one period of a match.
///
/// # Errors
/// `CoreError::InvalidConfig` when `config` does not validate.
pub fn analyze_period(data: &MatchData, period: u8, config: &AnalysisConfig) -> Result<PeriodAnalysis> {
    config.validate()?;
    let rosters = TeamRosters::from_possession(&data.possession);
    let possession = PossessionIndex::build(&data.possession);
    analyze_period_with(data, period, config, &rosters, &possession)
}

fn analyze_period_with(
    data: &MatchData,
    period: u8,
    config: &AnalysisConfig,
    rosters: &TeamRosters,
    possession: &PossessionIndex,
) -> Result<PeriodAnalysis> {
    let match_id = data.match_id();
    let tracking = filter_period(&data.tracking, period);
    if tracking.is_empty() {
        log::debug!("match {} period {}: no tracking data", match_id, period);
        return Ok(PeriodAnalysis::empty(match_id, period));
    }
    if !rosters.is_complete() {
        log::debug!(
            "match {} period {}: incomplete rosters (home {}, away {})",
            match_id,
            period,
            rosters.home.len(),
            rosters.away.len()
        );
        return Ok(PeriodAnalysis::empty(match_id, period));
    }

    let kinematics = compute_kinematics(&tracking, None);
    let pitch = data.metadata.pitch_or(config.pitch);
    let (records, stats) = analyze_offball_runs(&kinematics, possession, rosters, pitch, config)?;

    let mut trajectories = group_runs_to_trajectories(&records, config.max_frame_gap);
    let home_direction = data.metadata.home_direction(period);
    normalize_attack_direction(&mut trajectories, home_direction);
    for trajectory in &mut trajectories {
        trajectory.match_id = Some(match_id.to_string());
        trajectory.period = Some(period);
    }

    log::debug!(
        "match {} period {}: {} run frames → {} trajectories",
        match_id,
        period,
        records.len(),
        trajectories.len()
    );

    Ok(PeriodAnalysis {
        match_id: match_id.to_string(),
        period,
        records,
        trajectories,
        stats,
        home_direction,
    })
}

/// Analyse both periods of a match.
pub fn analyze_match(data: &MatchData, config: &AnalysisConfig) -> Result<MatchAnalysis> {
    config.validate()?;
    let rosters = TeamRosters::from_possession(&data.possession);
    let possession = PossessionIndex::build(&data.possession);

    let periods = MATCH_PERIODS
        .iter()
        .map(|&period| analyze_period_with(data, period, config, &rosters, &possession))
        .collect::<Result<Vec<_>>>()?;

    Ok(MatchAnalysis {
        metadata: data.metadata.clone(),
        periods,
    })
}

/// Loads match data by id for batch analysis.
pub trait MatchSource {
    fn load_match(&self, match_id: &str) -> anyhow::Result<MatchData>;
}

/// A match that could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFailure {
    pub match_id: String,
    pub message: String,
}

/// Run-frame records of one analysed match, both periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRunFrames {
    pub match_id: String,
    pub records: Vec<RunFrameRecord>,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Trajectories of every analysed match, in input order
    pub trajectories: Vec<Trajectory>,
    /// Run-frame records of every analysed match, in input order
    pub run_frames: Vec<MatchRunFrames>,
    /// Metadata of every analysed match, in input order
    pub analyzed: Vec<MatchMetadata>,
    pub failures: Vec<MatchFailure>,
}

impl BatchReport {
    pub fn match_count(&self) -> usize {
        self.analyzed.len()
    }
}

fn load_and_analyze<S>(source: &S, match_id: &str, config: &AnalysisConfig) -> Result<MatchAnalysis>
where
    S: MatchSource + ?Sized,
{
    let data = source.load_match(match_id).map_err(|source| CoreError::MatchLoad {
        match_id: match_id.to_string(),
        source,
    })?;
    analyze_match(&data, config)
}

/// Analyse every match in `match_ids`.
///
/// Matches run on the rayon pool when `config.parallel` is set; results
/// keep input order either way.
///
/// # Errors
/// Only `CoreError::InvalidConfig`. Per-match failures are collected in
/// the report.
pub fn analyze_matches<S>(match_ids: &[String], source: &S, config: &AnalysisConfig) -> Result<BatchReport>
where
    S: MatchSource + Sync + ?Sized,
{
    config.validate()?;
    let start = Instant::now();
    log::info!(
        "analyzing {} matches (threshold {:.1} m/s, lookahead {} frames, policy {:?})",
        match_ids.len(),
        config.speed_threshold_mps,
        config.lookahead_frames,
        config.policy
    );

    let results: Vec<Result<MatchAnalysis>> = if config.parallel {
        match_ids
            .par_iter()
            .map(|id| load_and_analyze(source, id, config))
            .collect()
    } else {
        match_ids
            .iter()
            .map(|id| load_and_analyze(source, id, config))
            .collect()
    };

    let mut report = BatchReport::default();
    for (match_id, result) in match_ids.iter().zip(results) {
        match result {
            Ok(analysis) => {
                report.trajectories.extend(analysis.trajectories().cloned());
                report.run_frames.push(MatchRunFrames {
                    match_id: analysis.match_id().to_string(),
                    records: analysis.records().cloned().collect(),
                });
                report.analyzed.push(analysis.metadata);
            }
            Err(e) => {
                log::warn!("match {} skipped: {}", match_id, e);
                report.failures.push(MatchFailure {
                    match_id: match_id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "batch done in {:.2?}: {} matches, {} trajectories, {} failures",
        start.elapsed(),
        report.analyzed.len(),
        report.trajectories.len(),
        report.failures.len()
    );

    Ok(report)
}
