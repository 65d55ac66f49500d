//! # Analysis Module
//!
//! Off-ball run and space-creation analysis over tracking data.
//!
//! ## Submodules
//!
//! - `kinematics` - Per-entity speed from consecutive positions
//! - `runs` - Sustained high-speed run detection
//! - `tessellation` - Voronoi controlled-area maps per frame
//! - `space` - Space created by off-ball runs, eligibility filter
//! - `trajectory` - Run-frame grouping and attack-direction normalization
//! - `summary` - Batch statistics and top performers

pub mod kinematics;
pub mod runs;
pub mod space;
pub mod summary;
pub mod tessellation;
pub mod trajectory;

pub use kinematics::{compute_kinematics, speed_from_positions};
pub use runs::{detect_run_segments, detect_runs, RunDetectorParams, RunSegment, RUN_SPEED_THRESHOLD_MPS};
pub use space::{
    analyze_offball_runs, check_eligibility, measure_space_creation, measure_team_space_creation,
    OffBallRunStats, RunFrameRecord, SkipReason, SpaceCreationPolicy, SpaceGain,
};
pub use summary::{
    player_stats, BatchSummary, PlayerDirectory, PlayerLabel, PlayerRunStats, TopPerformers,
    MIN_RUNS_FOR_EFFICIENCY,
};
pub use tessellation::{
    controlled_areas, tessellate, tessellate_frame, AreaCache, ControlledAreaMap, DegenerateReason,
    FrameTessellation, TessellationOutcome, TessellationStats, VoronoiCell, MIN_TESSELLATION_SITES,
};
pub use trajectory::{group_runs_to_trajectories, normalize_attack_direction, RunId, Trajectory};
