//! Analysis Configuration
//!
//! Every threshold of the run/space pipeline lives here instead of being
//! hardcoded in the algorithms. Values can come from presets, a YAML file,
//! or an environment-selected profile.
//!
//! ## Usage
//!
//! ```rust
//! use sc_core::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let strict = AnalysisConfig::strict();
//! let from_env = AnalysisConfig::from_env_or_default();
//! ```
//!
//! ## Environment Variables
//!
//! - `SC_ANALYSIS_PROFILE`: Select preset (strict, lenient, default)

use serde::{Deserialize, Serialize};
use std::env;

use crate::analysis::space::SpaceCreationPolicy;
use crate::error::{CoreError, Result};
use crate::models::PitchDimensions;

pub const PROFILE_ENV_VAR: &str = "SC_ANALYSIS_PROFILE";

/// Pipeline configuration shared by all analysis stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pitch used when match metadata carries no dimensions
    pub pitch: PitchDimensions,
    /// Minimum speed for a frame to count as running (m/s)
    pub speed_threshold_mps: f64,
    /// Minimum wall-clock run duration; `None` disables the gate
    pub min_run_duration_s: Option<f64>,
    /// Largest frame gap still treated as contiguous
    pub max_frame_gap: u32,
    /// Frames between run start and the space re-measurement
    pub lookahead_frames: u32,
    /// Whose area gain counts as created space
    pub policy: SpaceCreationPolicy,
    /// Keep run frames that created no space
    pub emit_non_positive: bool,
    /// Minimum entities in a frame for tessellation
    pub min_entities: usize,
    /// Tracking sample rate, used for frame → seconds conversions
    pub frame_rate_hz: f64,
    /// Process matches in parallel
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pitch: PitchDimensions::default(),
            speed_threshold_mps: 5.0,
            min_run_duration_s: None,
            max_frame_gap: 1,
            lookahead_frames: 30,
            policy: SpaceCreationPolicy::BallCarrier,
            emit_non_positive: false,
            min_entities: 4,
            frame_rate_hz: 10.0,
            parallel: false,
        }
    }
}

impl AnalysisConfig {
    /// Only sustained runs of 3 s or more
    pub fn strict() -> Self {
        Self {
            min_run_duration_s: Some(3.0),
            ..Self::default()
        }
    }

    /// Short runs, credit every teammate who gained space
    pub fn lenient() -> Self {
        Self {
            min_run_duration_s: Some(1.0),
            policy: SpaceCreationPolicy::AllTeammates,
            ..Self::default()
        }
    }

    pub fn from_profile(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "strict" => Self::strict(),
            "lenient" => Self::lenient(),
            _ => Self::default(),
        }
    }

    /// Load preset from `SC_ANALYSIS_PROFILE` environment variable.
    pub fn from_env_or_default() -> Self {
        match env::var(PROFILE_ENV_VAR) {
            Ok(profile) => Self::from_profile(&profile),
            Err(_) => Self::default(),
        }
    }

    /// Parse a YAML document; omitted fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.speed_threshold_mps > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "speed_threshold_mps must be positive, got {}",
                self.speed_threshold_mps
            )));
        }
        if !(self.pitch.length_m > 0.0 && self.pitch.width_m > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "pitch dimensions must be positive, got {}x{}",
                self.pitch.length_m, self.pitch.width_m
            )));
        }
        if let Some(min) = self.min_run_duration_s {
            if !(min >= 0.0) {
                return Err(CoreError::InvalidConfig(format!(
                    "min_run_duration_s must be non-negative, got {}",
                    min
                )));
            }
        }
        if self.lookahead_frames == 0 {
            return Err(CoreError::InvalidConfig(
                "lookahead_frames must be at least 1".to_string(),
            ));
        }
        if self.min_entities < 3 {
            return Err(CoreError::InvalidConfig(format!(
                "min_entities must be at least 3, got {}",
                self.min_entities
            )));
        }
        if !(self.frame_rate_hz > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "frame_rate_hz must be positive, got {}",
                self.frame_rate_hz
            )));
        }
        Ok(())
    }

    /// Lookahead window expressed in seconds.
    pub fn lookahead_seconds(&self) -> f64 {
        self.lookahead_frames as f64 / self.frame_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AnalysisConfig::default();
        assert!((cfg.speed_threshold_mps - 5.0).abs() < 1e-9);
        assert_eq!(cfg.lookahead_frames, 30);
        assert_eq!(cfg.max_frame_gap, 1);
        assert_eq!(cfg.min_run_duration_s, None);
        assert_eq!(cfg.policy, SpaceCreationPolicy::BallCarrier);
        assert!((cfg.lookahead_seconds() - 3.0).abs() < 1e-9);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets_differ_in_duration_gate() {
        assert_eq!(AnalysisConfig::strict().min_run_duration_s, Some(3.0));
        let lenient = AnalysisConfig::lenient();
        assert_eq!(lenient.min_run_duration_s, Some(1.0));
        assert_eq!(lenient.policy, SpaceCreationPolicy::AllTeammates);
    }

    #[test]
    fn test_from_profile_fallback() {
        assert_eq!(AnalysisConfig::from_profile("STRICT"), AnalysisConfig::strict());
        assert_eq!(AnalysisConfig::from_profile("whatever"), AnalysisConfig::default());
    }

    #[test]
    fn test_yaml_partial_override() {
        let cfg = AnalysisConfig::from_yaml_str(
            "speed_threshold_mps: 6.5\nlookahead_frames: 20\npolicy: all_teammates\n",
        )
        .unwrap();
        assert!((cfg.speed_threshold_mps - 6.5).abs() < 1e-9);
        assert_eq!(cfg.lookahead_frames, 20);
        assert_eq!(cfg.policy, SpaceCreationPolicy::AllTeammates);
        assert!((cfg.pitch.length_m - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_yaml_rejects_invalid_values() {
        let err = AnalysisConfig::from_yaml_str("speed_threshold_mps: -1.0\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));

        let err = AnalysisConfig::from_yaml_str("lookahead_frames: 0\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_nan_threshold_is_invalid() {
        let cfg = AnalysisConfig {
            speed_threshold_mps: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
