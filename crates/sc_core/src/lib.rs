//! # sc_core - Off-Ball Run Space-Creation Analysis
//!
//! Measures how much controlled space a football player's off-ball run
//! opens up for the teammate in possession, from 10 Hz tracking data.
//!
//! ## Features
//! - Speed estimation and sustained-run detection
//! - Voronoi controlled-area maps with explicit degenerate outcomes
//! - Ball-carrier and all-teammates space-creation policies
//! - Per-run trajectories normalized to a left-to-right attack
//! - Batch orchestration that survives per-match failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sc_core::{analyze_match, AnalysisConfig, MatchData, MatchMetadata};
//!
//! let data = MatchData {
//!     metadata: MatchMetadata::new("1996435"),
//!     tracking: Vec::new(),
//!     possession: Vec::new(),
//!     ball: Vec::new(),
//! };
//! let analysis = analyze_match(&data, &AnalysisConfig::from_env_or_default()).unwrap();
//! println!("{} runs", analysis.trajectories().count());
//! ```

// Doc formatting lints - purely cosmetic
#![allow(clippy::doc_lazy_continuation)]
// Struct initialization pattern used intentionally in tests
#![allow(clippy::field_reassign_with_default)]
// Geometry helpers take several scalar parameters
#![allow(clippy::too_many_arguments)]
// `!(x > 0.0)` also rejects NaN
#![allow(clippy::neg_cmp_op_on_partial_ord)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;

pub use analysis::{
    analyze_offball_runs, compute_kinematics, controlled_areas, detect_runs, group_runs_to_trajectories,
    measure_space_creation, normalize_attack_direction, player_stats, tessellate, BatchSummary,
    ControlledAreaMap, PlayerDirectory, PlayerRunStats, RunFrameRecord, RunId, SpaceCreationPolicy,
    TessellationOutcome, TopPerformers, Trajectory,
};
pub use config::AnalysisConfig;
pub use error::{CoreError, Result};
pub use models::{
    AttackDirection, BallSample, MatchData, MatchMetadata, PitchDimensions, PossessionGroup,
    PossessionRecord, TeamSide, TrackingSample,
};
pub use pipeline::{
    analyze_match, analyze_matches, analyze_period, BatchReport, MatchAnalysis, MatchFailure, MatchRunFrames,
    MatchSource, PeriodAnalysis,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
