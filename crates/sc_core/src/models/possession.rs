//! # Possession and Team Membership
//!
//! Possession annotations per frame and the entity → team map derived from them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which team a frame's possession is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PossessionGroup {
    #[serde(rename = "home team")]
    Home,
    #[serde(rename = "away team")]
    Away,
}

impl PossessionGroup {
    /// Parse the provider vocabulary. Anything unrecognised is "no group".
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "home team" => Some(PossessionGroup::Home),
            "away team" => Some(PossessionGroup::Away),
            _ => None,
        }
    }

    pub fn team(self) -> TeamSide {
        match self {
            PossessionGroup::Home => TeamSide::Home,
            PossessionGroup::Away => TeamSide::Away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamSide::Home => "home",
            TeamSide::Away => "away",
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Possession annotation for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossessionRecord {
    pub frame: u32,
    pub timestamp_s: f64,
    pub period: u8,
    /// Player in possession, if resolvable
    pub entity_id: Option<u32>,
    pub group: Option<PossessionGroup>,
}

/// Frame → possession lookup. The first record of a frame wins.
#[derive(Debug, Clone, Default)]
pub struct PossessionIndex {
    by_frame: FxHashMap<u32, PossessionRecord>,
}

impl PossessionIndex {
    pub fn build(records: &[PossessionRecord]) -> Self {
        let mut by_frame = FxHashMap::default();
        for record in records {
            by_frame.entry(record.frame).or_insert_with(|| record.clone());
        }
        Self { by_frame }
    }

    pub fn get(&self, frame: u32) -> Option<&PossessionRecord> {
        self.by_frame.get(&frame)
    }

    /// Possessor at `frame`, `None` when no record exists or the player is unresolved.
    pub fn possessor(&self, frame: u32) -> Option<u32> {
        self.by_frame.get(&frame).and_then(|r| r.entity_id)
    }
}

/// Entity → team membership for one match.
///
/// Built from possession group labels: an entity that never held the ball
/// is on neither roster and is therefore invisible to run analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRosters {
    pub home: Vec<u32>,
    pub away: Vec<u32>,
    team_of: FxHashMap<u32, TeamSide>,
}

impl TeamRosters {
    pub fn from_possession(records: &[PossessionRecord]) -> Self {
        let mut home = Vec::new();
        let mut away = Vec::new();
        for record in records {
            let (Some(entity_id), Some(group)) = (record.entity_id, record.group) else {
                continue;
            };
            let roster = match group {
                PossessionGroup::Home => &mut home,
                PossessionGroup::Away => &mut away,
            };
            if !roster.contains(&entity_id) {
                roster.push(entity_id);
            }
        }
        Self::new(home, away)
    }

    /// Away membership is applied last, so it wins for an entity listed on both sides.
    pub fn new(home: Vec<u32>, away: Vec<u32>) -> Self {
        let mut team_of = FxHashMap::default();
        for &id in &home {
            team_of.insert(id, TeamSide::Home);
        }
        for &id in &away {
            team_of.insert(id, TeamSide::Away);
        }
        Self {
            home,
            away,
            team_of,
        }
    }

    pub fn team_of(&self, entity_id: u32) -> Option<TeamSide> {
        self.team_of.get(&entity_id).copied()
    }

    /// Both sides have at least one known player.
    pub fn is_complete(&self) -> bool {
        !self.home.is_empty() && !self.away.is_empty()
    }

    pub fn teammates(&self, team: TeamSide) -> impl Iterator<Item = u32> + '_ {
        self.team_of
            .iter()
            .filter(move |(_, &side)| side == team)
            .map(|(&id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame: u32, entity_id: Option<u32>, group: Option<PossessionGroup>) -> PossessionRecord {
        PossessionRecord {
            frame,
            timestamp_s: frame as f64 / 10.0,
            period: 1,
            entity_id,
            group,
        }
    }

    #[test]
    fn test_group_labels() {
        assert_eq!(PossessionGroup::from_label("home team"), Some(PossessionGroup::Home));
        assert_eq!(PossessionGroup::from_label("away team"), Some(PossessionGroup::Away));
        assert_eq!(PossessionGroup::from_label("none"), None);
    }

    #[test]
    fn test_rosters_from_possession() {
        let records = vec![
            record(1, Some(10), Some(PossessionGroup::Home)),
            record(2, Some(11), Some(PossessionGroup::Home)),
            record(3, Some(10), Some(PossessionGroup::Home)),
            record(4, Some(20), Some(PossessionGroup::Away)),
            record(5, None, Some(PossessionGroup::Away)),
            record(6, Some(30), None),
        ];
        let rosters = TeamRosters::from_possession(&records);

        assert_eq!(rosters.home, vec![10, 11]);
        assert_eq!(rosters.away, vec![20]);
        assert_eq!(rosters.team_of(10), Some(TeamSide::Home));
        assert_eq!(rosters.team_of(20), Some(TeamSide::Away));
        assert_eq!(rosters.team_of(30), None, "ungrouped possessor stays untracked");
        assert!(rosters.is_complete());
    }

    #[test]
    fn test_away_wins_on_conflict() {
        let rosters = TeamRosters::new(vec![7], vec![7]);
        assert_eq!(rosters.team_of(7), Some(TeamSide::Away));
    }

    #[test]
    fn test_possession_index_first_record_wins() {
        let records = vec![
            record(50, Some(1), Some(PossessionGroup::Home)),
            record(50, Some(2), Some(PossessionGroup::Home)),
            record(51, None, None),
        ];
        let index = PossessionIndex::build(&records);
        assert_eq!(index.possessor(50), Some(1));
        assert_eq!(index.possessor(51), None);
        assert!(index.get(51).is_some());
        assert!(index.get(52).is_none());
    }
}
