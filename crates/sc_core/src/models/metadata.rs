//! # Match Metadata
//!
//! Static per-match information: pitch size, per-period attack direction of
//! the home team, and optional team/player descriptors for reports.

use serde::{Deserialize, Serialize};

use super::possession::{PossessionRecord, TeamSide};
use super::tracking::{BallSample, TrackingSample};

pub const DEFAULT_PITCH_LENGTH_M: f64 = 105.0;
pub const DEFAULT_PITCH_WIDTH_M: f64 = 68.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchDimensions {
    pub length_m: f64,
    pub width_m: f64,
}

impl Default for PitchDimensions {
    fn default() -> Self {
        Self {
            length_m: DEFAULT_PITCH_LENGTH_M,
            width_m: DEFAULT_PITCH_WIDTH_M,
        }
    }
}

impl PitchDimensions {
    pub fn new(length_m: f64, width_m: f64) -> Self {
        Self { length_m, width_m }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.length_m * self.width_m
    }
}

/// Direction the home team attacks in a given period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackDirection {
    LeftToRight,
    RightToLeft,
}

impl AttackDirection {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "left_to_right" => Some(AttackDirection::LeftToRight),
            "right_to_left" => Some(AttackDirection::RightToLeft),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            AttackDirection::LeftToRight => AttackDirection::RightToLeft,
            AttackDirection::RightToLeft => AttackDirection::LeftToRight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: u32,
    pub name: String,
    pub score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub team_id: u32,
}

impl PlayerInfo {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub match_id: String,
    /// Home attack direction per period; may be shorter than the number of periods
    pub home_team_side: Vec<AttackDirection>,
    /// Pitch size reported by the provider
    pub pitch: Option<PitchDimensions>,
    pub home_team: Option<TeamInfo>,
    pub away_team: Option<TeamInfo>,
    pub players: Vec<PlayerInfo>,
}

impl MatchMetadata {
    pub fn new(match_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            home_team_side: Vec::new(),
            pitch: None,
            home_team: None,
            away_team: None,
            players: Vec::new(),
        }
    }

    /// Provider pitch, or `fallback` when the metadata has none.
    pub fn pitch_or(&self, fallback: PitchDimensions) -> PitchDimensions {
        self.pitch.unwrap_or(fallback)
    }

    /// Home attack direction in `period` (1-based), if recorded.
    pub fn home_direction(&self, period: u8) -> Option<AttackDirection> {
        let idx = (period as usize).checked_sub(1)?;
        self.home_team_side.get(idx).copied()
    }

    /// Attack direction of `team` in `period`.
    pub fn direction_of(&self, team: TeamSide, period: u8) -> Option<AttackDirection> {
        let home = self.home_direction(period)?;
        Some(match team {
            TeamSide::Home => home,
            TeamSide::Away => home.opposite(),
        })
    }

    pub fn team_name(&self, team_id: u32) -> Option<&str> {
        [&self.home_team, &self.away_team]
            .into_iter()
            .flatten()
            .find(|t| t.id == team_id)
            .map(|t| t.name.as_str())
    }
}

/// Everything the analysis needs for one match, already flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchData {
    pub metadata: MatchMetadata,
    pub tracking: Vec<TrackingSample>,
    pub possession: Vec<PossessionRecord>,
    pub ball: Vec<BallSample>,
}

impl MatchData {
    pub fn match_id(&self) -> &str {
        &self.metadata.match_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pitch_area() {
        assert!((PitchDimensions::default().area() - 7140.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_per_period() {
        let mut meta = MatchMetadata::new("1");
        meta.home_team_side = vec![AttackDirection::LeftToRight, AttackDirection::RightToLeft];

        assert_eq!(meta.home_direction(1), Some(AttackDirection::LeftToRight));
        assert_eq!(meta.home_direction(2), Some(AttackDirection::RightToLeft));
        assert_eq!(meta.home_direction(3), None);
        assert_eq!(meta.home_direction(0), None);
        assert_eq!(
            meta.direction_of(TeamSide::Away, 2),
            Some(AttackDirection::LeftToRight)
        );
    }

    #[test]
    fn test_pitch_fallback() {
        let mut meta = MatchMetadata::new("1");
        let fallback = PitchDimensions::new(100.0, 64.0);
        assert_eq!(meta.pitch_or(fallback), fallback);

        meta.pitch = Some(PitchDimensions::new(104.0, 68.0));
        assert!((meta.pitch_or(fallback).area() - 7072.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_labels() {
        assert_eq!(
            AttackDirection::from_label("right_to_left"),
            Some(AttackDirection::RightToLeft)
        );
        assert_eq!(AttackDirection::from_label("up"), None);
    }

    #[test]
    fn test_team_name_lookup() {
        let mut meta = MatchMetadata::new("1");
        meta.home_team = Some(TeamInfo { id: 5, name: "Sydney FC".into(), score: Some(4) });
        meta.away_team = Some(TeamInfo { id: 6, name: "Adelaide United".into(), score: Some(1) });
        assert_eq!(meta.team_name(6), Some("Adelaide United"));
        assert_eq!(meta.team_name(7), None);
    }
}
