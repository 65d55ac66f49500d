//! # Run Statistics
//!
//! Batch-level aggregates over trajectories plus per-player rankings used
//! by report layers.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::trajectory::Trajectory;
use crate::models::MatchMetadata;

/// m/s → km/h
pub const MPS_TO_KMH: f64 = 3.6;

/// Minimum number of runs before a player competes for "most efficient".
pub const MIN_RUNS_FOR_EFFICIENCY: u32 = 5;

/// Aggregates over every trajectory of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub match_count: usize,
    pub total_runs: usize,
    pub runs_per_match: f64,
    pub total_space_created: f64,
    pub mean_space_per_run: f64,
    /// Mean space per run as a percentage of the pitch area
    pub mean_space_pct_of_pitch: f64,
    pub mean_peak_speed_mps: f64,
    pub mean_peak_speed_kmh: f64,
    pub mean_duration_frames: f64,
    pub mean_duration_s: f64,
}

impl BatchSummary {
    pub fn from_trajectories(
        trajectories: &[Trajectory],
        match_count: usize,
        pitch_area: f64,
        frame_rate_hz: f64,
    ) -> Self {
        let total_runs = trajectories.len();
        if total_runs == 0 {
            return Self {
                match_count,
                ..Self::default()
            };
        }

        let n = total_runs as f64;
        let total_space_created: f64 = trajectories.iter().map(|t| t.total_space_created).sum();
        let mean_space_per_run = total_space_created / n;
        let mean_peak_speed_mps = trajectories.iter().map(|t| t.max_speed).sum::<f64>() / n;
        let mean_duration_frames = trajectories.iter().map(|t| t.duration_frames as f64).sum::<f64>() / n;

        Self {
            match_count,
            total_runs,
            runs_per_match: if match_count > 0 { n / match_count as f64 } else { 0.0 },
            total_space_created,
            mean_space_per_run,
            mean_space_pct_of_pitch: if pitch_area > 0.0 {
                mean_space_per_run / pitch_area * 100.0
            } else {
                0.0
            },
            mean_peak_speed_mps,
            mean_peak_speed_kmh: mean_peak_speed_mps * MPS_TO_KMH,
            mean_duration_frames,
            mean_duration_s: mean_duration_frames / frame_rate_hz,
        }
    }
}

/// Per-player aggregates across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRunStats {
    pub entity_id: u32,
    pub runs: u32,
    pub total_space: f64,
    pub mean_space_per_run: f64,
    pub matches_played: u32,
    pub runs_per_match: f64,
    pub space_per_match: f64,
}

/// Aggregate trajectories per entity, ordered by entity id.
///
/// Matches are counted from the trajectory `match_id` tags; untagged
/// trajectories count as a single match.
pub fn player_stats(trajectories: &[Trajectory]) -> Vec<PlayerRunStats> {
    let mut grouped: BTreeMap<u32, (u32, f64, BTreeSet<Option<&str>>)> = BTreeMap::new();
    for t in trajectories {
        let entry = grouped.entry(t.entity_id).or_default();
        entry.0 += 1;
        entry.1 += t.total_space_created;
        entry.2.insert(t.match_id.as_deref());
    }

    grouped
        .into_iter()
        .map(|(entity_id, (runs, total_space, matches))| {
            let matches_played = matches.len() as u32;
            PlayerRunStats {
                entity_id,
                runs,
                total_space,
                mean_space_per_run: total_space / runs as f64,
                matches_played,
                runs_per_match: runs as f64 / matches_played as f64,
                space_per_match: total_space / matches_played as f64,
            }
        })
        .collect()
}

/// Highlights of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopPerformers {
    pub most_runs_per_match: Option<PlayerRunStats>,
    pub most_space_per_match: Option<PlayerRunStats>,
    /// Highest mean space per run among players with enough runs
    pub most_efficient: Option<PlayerRunStats>,
}

impl TopPerformers {
    pub fn select(stats: &[PlayerRunStats], min_runs_for_efficiency: u32) -> Self {
        Self {
            most_runs_per_match: best_by(stats.iter(), |s| s.runs_per_match),
            most_space_per_match: best_by(stats.iter(), |s| s.space_per_match),
            most_efficient: best_by(
                stats.iter().filter(|s| s.runs >= min_runs_for_efficiency),
                |s| s.mean_space_per_run,
            ),
        }
    }
}

/// Largest by `key`; the first one wins ties.
fn best_by<'a>(
    stats: impl Iterator<Item = &'a PlayerRunStats>,
    key: impl Fn(&PlayerRunStats) -> f64,
) -> Option<PlayerRunStats> {
    stats
        .fold(None::<&PlayerRunStats>, |best, s| match best {
            Some(b) if key(b) >= key(s) => Some(b),
            _ => Some(s),
        })
        .cloned()
}

/// Display name and team of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLabel {
    pub name: String,
    pub team: String,
}

/// Entity id → human-readable label, merged over match metadata.
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    labels: FxHashMap<u32, PlayerLabel>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every player of one match; later matches overwrite earlier ones.
    pub fn add_match(&mut self, metadata: &MatchMetadata) {
        let home_id = metadata.home_team.as_ref().map(|t| t.id);
        for player in &metadata.players {
            let team = if Some(player.team_id) == home_id {
                metadata.home_team.as_ref()
            } else {
                metadata.away_team.as_ref()
            };
            self.labels.insert(
                player.id,
                PlayerLabel {
                    name: player.display_name(),
                    team: team.map(|t| t.name.clone()).unwrap_or_else(|| "Unknown".to_string()),
                },
            );
        }
    }

    pub fn from_metadata<'a>(metadata: impl IntoIterator<Item = &'a MatchMetadata>) -> Self {
        let mut directory = Self::new();
        for meta in metadata {
            directory.add_match(meta);
        }
        directory
    }

    /// Label of `entity_id`, with a placeholder for unknown players.
    pub fn label(&self, entity_id: u32) -> PlayerLabel {
        self.labels.get(&entity_id).cloned().unwrap_or_else(|| PlayerLabel {
            name: format!("Player {entity_id}"),
            team: "Unknown".to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
