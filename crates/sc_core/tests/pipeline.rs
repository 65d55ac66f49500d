//! End-to-end batch analysis over synthetic matches.

use std::collections::HashMap;

use sc_core::analysis::summary::MIN_RUNS_FOR_EFFICIENCY;
use sc_core::{
    analyze_match, analyze_matches, controlled_areas, player_stats, AnalysisConfig, AttackDirection, BatchSummary,
    MatchData, MatchMetadata, MatchSource, PitchDimensions, PlayerDirectory, PossessionGroup,
    PossessionRecord, SpaceCreationPolicy, TeamSide, TopPerformers, TrackingSample,
};

/// Home carrier 1 at the origin, home runner 2 sprinting away along +x,
/// home 3 and away 4/5 standing in a ring around the carrier.
fn ring_match(match_id: &str, directions: Vec<AttackDirection>) -> MatchData {
    let ring = [(20.0, 0.0), (0.0, 20.0), (-20.0, 0.0), (0.0, -20.0)];
    let mut tracking = Vec::new();
    let mut possession = Vec::new();
    for (period, offset) in [(1u8, 0u32), (2, 1000)] {
        for step in 0..=40u32 {
            let frame = offset + step;
            let ts = step as f64 / 10.0;
            tracking.push(TrackingSample::new(frame, ts, period, 1, 0.0, 0.0));
            for (k, &(x, y)) in ring.iter().enumerate() {
                let x = if k == 0 { x + 0.6 * step as f64 } else { x };
                tracking.push(TrackingSample::new(frame, ts, period, k as u32 + 2, x, y));
            }
            possession.push(PossessionRecord {
                frame,
                timestamp_s: ts,
                period,
                entity_id: Some(1),
                group: Some(PossessionGroup::Home),
            });
        }
        for (frame, entity_id, group) in [
            (offset + 41, 4, PossessionGroup::Away),
            (offset + 42, 3, PossessionGroup::Home),
            (offset + 43, 2, PossessionGroup::Home),
        ] {
            possession.push(PossessionRecord {
                frame,
                timestamp_s: (frame - offset) as f64 / 10.0,
                period,
                entity_id: Some(entity_id),
                group: Some(group),
            });
        }
    }

    let mut metadata = MatchMetadata::new(match_id);
    metadata.home_team_side = directions;
    MatchData {
        metadata,
        tracking,
        possession,
        ball: Vec::new(),
    }
}

struct InMemorySource(HashMap<String, MatchData>);

impl MatchSource for InMemorySource {
    fn load_match(&self, match_id: &str) -> anyhow::Result<MatchData> {
        self.0
            .get(match_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("match {match_id} not found"))
    }
}

fn source() -> InMemorySource {
    let mut matches = HashMap::new();
    matches.insert(
        "1".to_string(),
        ring_match("1", vec![AttackDirection::LeftToRight, AttackDirection::RightToLeft]),
    );
    matches.insert(
        "2".to_string(),
        ring_match("2", vec![AttackDirection::RightToLeft, AttackDirection::LeftToRight]),
    );
    InMemorySource(matches)
}

#[test]
fn test_batch_normalizes_every_home_run_left_to_right() {
    let ids: Vec<String> = ["1", "2", "missing"].iter().map(|s| s.to_string()).collect();
    let report = analyze_matches(&ids, &source(), &AnalysisConfig::default()).unwrap();

    assert_eq!(report.match_count(), 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("not found"));
    assert_eq!(report.trajectories.len(), 4, "one run per period per match");

    for t in &report.trajectories {
        assert_eq!(t.team, TeamSide::Home);
        assert_eq!(t.entity_id, 2);
        let home_direction = match (t.match_id.as_deref(), t.period) {
            (Some("1"), Some(1)) | (Some("2"), Some(2)) => AttackDirection::LeftToRight,
            _ => AttackDirection::RightToLeft,
        };
        match home_direction {
            AttackDirection::LeftToRight => assert!(t.start_x > 0.0 && t.end_x > t.start_x),
            AttackDirection::RightToLeft => assert!(t.start_x < 0.0 && t.end_x < t.start_x),
        }
    }
}

#[test]
fn test_batch_summary_and_top_performers() {
    let ids: Vec<String> = ["1", "2"].iter().map(|s| s.to_string()).collect();
    let config = AnalysisConfig::default();
    let report = analyze_matches(&ids, &source(), &config).unwrap();

    let summary =
        BatchSummary::from_trajectories(&report.trajectories, report.match_count(), config.pitch.area(), 10.0);
    assert_eq!(summary.total_runs, 4);
    assert!((summary.runs_per_match - 2.0).abs() < 1e-9);
    assert!((summary.mean_duration_frames - 10.0).abs() < 1e-9);
    assert!((summary.mean_duration_s - 1.0).abs() < 1e-9);

    let stats = player_stats(&report.trajectories);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].matches_played, 2);

    let top = TopPerformers::select(&stats, MIN_RUNS_FOR_EFFICIENCY);
    assert_eq!(top.most_runs_per_match.map(|s| s.entity_id), Some(2));
    assert!(top.most_efficient.is_none(), "four runs are below the efficiency minimum");

    let directory = PlayerDirectory::from_metadata(&report.analyzed);
    assert_eq!(directory.label(2).name, "Player 2");
}

#[test]
fn test_all_teammates_policy_records_beneficiaries() {
    let ids = vec!["1".to_string()];
    let config = AnalysisConfig {
        policy: SpaceCreationPolicy::AllTeammates,
        parallel: true,
        ..AnalysisConfig::default()
    };
    let report = analyze_matches(&ids, &source(), &config).unwrap();
    assert_eq!(report.trajectories.len(), 2);

    let data = ring_match("1", vec![AttackDirection::LeftToRight, AttackDirection::RightToLeft]);
    let analysis = analyze_match(&data, &config).unwrap();
    let pitch = PitchDimensions::default();
    let records: Vec<_> = analysis.records().collect();
    assert_eq!(records.len(), 20, "frames 1..=10 of each period");

    for record in records {
        assert_eq!(record.entity_id, 2);
        assert_eq!(record.possessor_id, 1);

        // Home teammates of the runner: carrier 1 and bystander 3
        let before = controlled_areas(&data.tracking, record.frame, &pitch);
        let after = controlled_areas(&data.tracking, record.frame + config.lookahead_frames, &pitch);
        let gains: Vec<f64> = [1u32, 3]
            .iter()
            .map(|id| after[id] - before[id])
            .filter(|&gain| gain > 0.0)
            .collect();
        let runner_gain = after[&2] - before[&2];

        assert_eq!(record.beneficiaries as usize, gains.len(), "frame {}", record.frame);
        assert!(record.beneficiaries >= 1);
        assert!(
            (record.space_created - gains.iter().sum::<f64>()).abs() < 1e-6,
            "frame {}: {} vs {:?}",
            record.frame,
            record.space_created,
            gains
        );
        // Carrier cell widens by 0.3 m per frame over 30 frames on a 20 m side
        assert!((record.space_created - 180.0).abs() < 1e-6);
        assert!(runner_gain.abs() < 1e-9, "runner on the hull keeps the fallback area");
    }
}

#[test]
fn test_all_teammates_policy_skips_the_runner() {
    // Runner 2 breaks out between two markers into open space: its own cell
    // grows far more than the carrier's, and must not be counted
    let layout = [
        (3u32, -40.0, 30.0),
        (4, -40.0, -30.0),
        (5, 40.0, 30.0),
        (6, 40.0, -30.0),
        (1, -15.0, 0.0),
        (7, -5.0, 8.0),
        (8, -5.0, -8.0),
    ];
    let mut tracking = Vec::new();
    let mut possession = Vec::new();
    for step in 0..=40u32 {
        let ts = step as f64 / 10.0;
        for &(id, x, y) in &layout {
            tracking.push(TrackingSample::new(step, ts, 1, id, x, y));
        }
        tracking.push(TrackingSample::new(step, ts, 1, 2, -5.0 + 0.6 * step as f64, 0.0));
        possession.push(PossessionRecord {
            frame: step,
            timestamp_s: ts,
            period: 1,
            entity_id: Some(1),
            group: Some(PossessionGroup::Home),
        });
    }
    for (frame, entity_id, group) in [(41, 2, PossessionGroup::Home), (42, 4, PossessionGroup::Away)] {
        possession.push(PossessionRecord {
            frame,
            timestamp_s: frame as f64 / 10.0,
            period: 1,
            entity_id: Some(entity_id),
            group: Some(group),
        });
    }
    let data = MatchData {
        metadata: MatchMetadata::new("breakout"),
        tracking,
        possession,
        ball: Vec::new(),
    };

    let config = AnalysisConfig {
        policy: SpaceCreationPolicy::AllTeammates,
        ..AnalysisConfig::default()
    };
    let analysis = analyze_match(&data, &config).unwrap();
    let pitch = PitchDimensions::default();
    let records: Vec<_> = analysis.records().collect();
    assert_eq!(records.len(), 10, "frames 1..=10 have a lookahead frame");

    for record in records {
        let before = controlled_areas(&data.tracking, record.frame, &pitch);
        let after = controlled_areas(&data.tracking, record.frame + config.lookahead_frames, &pitch);
        let runner_gain = after[&2] - before[&2];
        let carrier_gain = after[&1] - before[&1];
        assert!(carrier_gain > 0.0);
        assert!(runner_gain > carrier_gain, "frame {}: runner gain {}", record.frame, runner_gain);

        assert_eq!(record.beneficiaries, 1, "only the carrier benefits");
        assert!(
            (record.space_created - carrier_gain).abs() < 1e-6,
            "frame {}: expected {}, got {}",
            record.frame,
            carrier_gain,
            record.space_created
        );
    }
}

#[test]
fn test_pentagon_areas_fit_the_pitch() {
    let pentagon = [(0.0, 10.0), (9.5, 3.1), (5.9, -8.1), (-5.9, -8.1), (-9.5, 3.1)];
    let samples: Vec<TrackingSample> = pentagon
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| TrackingSample::new(100, 10.0, 1, i as u32 + 1, x, y))
        .collect();

    let pitch = PitchDimensions::default();
    let areas = controlled_areas(&samples, 100, &pitch);
    assert_eq!(areas.len(), 5);
    assert!(areas.values().all(|&a| a > 0.0));
    assert!(areas.values().sum::<f64>() <= pitch.area() + 1e-6);
}
