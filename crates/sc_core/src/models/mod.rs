//! # Data Model
//!
//! - `tracking` - Per-frame entity positions and ball samples
//! - `possession` - Possession annotations and team rosters
//! - `metadata` - Pitch, attack directions, team/player descriptors

pub mod metadata;
pub mod possession;
pub mod tracking;

pub use metadata::{
    AttackDirection, MatchData, MatchMetadata, PitchDimensions, PlayerInfo, TeamInfo,
    DEFAULT_PITCH_LENGTH_M, DEFAULT_PITCH_WIDTH_M,
};
pub use possession::{PossessionGroup, PossessionIndex, PossessionRecord, TeamRosters, TeamSide};
pub use tracking::{filter_period, parse_timestamp, BallSample, FrameIndex, TrackingSample};
