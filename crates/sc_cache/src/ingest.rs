//! Tracking Ingestion
//!
//! Provider JSONL frames and match JSON → flat sc_core tables.
//!
//! One JSONL line per frame:
//! `{"frame", "timestamp", "period", "player_data": [{"player_id", "x", "y", "is_detected"}],
//!   "ball_data": {"x", "y"}, "possession": {"player_id", "group"}}`.
//! Frames without a period or timestamp (pre-kickoff, breaks) are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use sc_core::models::{parse_timestamp, PlayerInfo, TeamInfo};
use sc_core::{
    AttackDirection, BallSample, MatchData, MatchMetadata, PitchDimensions, PossessionGroup,
    PossessionRecord, TrackingSample,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawFrame {
    frame: u32,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    period: Option<u8>,
    #[serde(default)]
    player_data: Vec<RawPlayer>,
    #[serde(default)]
    ball_data: Option<RawBall>,
    #[serde(default)]
    possession: Option<RawPossession>,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    player_id: u32,
    x: Option<f64>,
    y: Option<f64>,
    #[serde(default)]
    is_detected: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawBall {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPossession {
    player_id: Option<u32>,
    group: Option<String>,
}

/// Ingestion statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u32,
    pub frames: u32,
    pub skipped_no_period: u32,
    pub skipped_no_timestamp: u32,
    /// Players without coordinates
    pub skipped_players: u32,
    pub samples: u32,
    pub possession_records: u32,
    pub ball_samples: u32,
}

/// Flat tables of one match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingTables {
    pub tracking: Vec<TrackingSample>,
    pub possession: Vec<PossessionRecord>,
    pub ball: Vec<BallSample>,
}

/// Parse JSONL tracking frames.
pub fn parse_tracking_jsonl<R: BufRead>(reader: R) -> Result<(TrackingTables, IngestStats)> {
    let mut tables = TrackingTables::default();
    let mut stats = IngestStats::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let raw: RawFrame = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse frame on line {}", line_no + 1))?;
        let Some(period) = raw.period else {
            stats.skipped_no_period += 1;
            continue;
        };
        let Some(timestamp) = raw.timestamp.as_deref() else {
            stats.skipped_no_timestamp += 1;
            continue;
        };
        let timestamp_s = parse_timestamp(timestamp)
            .with_context(|| format!("Bad timestamp on line {}", line_no + 1))?;
        stats.frames += 1;

        for player in &raw.player_data {
            let (Some(x), Some(y)) = (player.x, player.y) else {
                stats.skipped_players += 1;
                continue;
            };
            let mut sample = TrackingSample::new(raw.frame, timestamp_s, period, player.player_id, x, y);
            sample.detected = player.is_detected.unwrap_or(false);
            tables.tracking.push(sample);
        }

        if let Some(ball) = raw.ball_data {
            tables.ball.push(BallSample {
                frame: raw.frame,
                timestamp_s,
                period,
                x: ball.x,
                y: ball.y,
            });
        }

        if let Some(possession) = raw.possession {
            tables.possession.push(PossessionRecord {
                frame: raw.frame,
                timestamp_s,
                period,
                entity_id: possession.player_id,
                group: possession.group.as_deref().and_then(PossessionGroup::from_label),
            });
        }
    }

    stats.samples = tables.tracking.len() as u32;
    stats.possession_records = tables.possession.len() as u32;
    stats.ball_samples = tables.ball.len() as u32;
    Ok((tables, stats))
}

pub fn read_tracking_jsonl(path: &Path) -> Result<(TrackingTables, IngestStats)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open tracking file: {}", path.display()))?;
    parse_tracking_jsonl(BufReader::new(file))
        .with_context(|| format!("Failed to ingest tracking file: {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: u32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawPlayerInfo {
    id: u32,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    team_id: u32,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    home_team_side: Vec<String>,
    #[serde(default)]
    pitch_length: Option<f64>,
    #[serde(default)]
    pitch_width: Option<f64>,
    #[serde(default)]
    home_team: Option<RawTeam>,
    #[serde(default)]
    away_team: Option<RawTeam>,
    #[serde(default)]
    home_team_score: Option<u32>,
    #[serde(default)]
    away_team_score: Option<u32>,
    #[serde(default)]
    players: Vec<RawPlayerInfo>,
}

/// Parse a provider match JSON document.
///
/// Attack directions are kept up to the first unrecognised label so that
/// index `period - 1` always refers to the right period.
pub fn parse_metadata_json(match_id: &str, json: &str) -> Result<MatchMetadata> {
    let raw: RawMetadata = serde_json::from_str(json).context("Failed to parse match metadata")?;

    let mut metadata = MatchMetadata::new(match_id);
    for label in &raw.home_team_side {
        match AttackDirection::from_label(label) {
            Some(direction) => metadata.home_team_side.push(direction),
            None => {
                log::warn!("match {}: unknown attack direction {:?}", match_id, label);
                break;
            }
        }
    }

    metadata.pitch = match (raw.pitch_length, raw.pitch_width) {
        (Some(length), Some(width)) if length > 0.0 && width > 0.0 => {
            Some(PitchDimensions::new(length, width))
        }
        _ => None,
    };
    metadata.home_team = raw.home_team.map(|t| TeamInfo {
        id: t.id,
        name: t.name,
        score: raw.home_team_score,
    });
    metadata.away_team = raw.away_team.map(|t| TeamInfo {
        id: t.id,
        name: t.name,
        score: raw.away_team_score,
    });
    metadata.players = raw
        .players
        .into_iter()
        .map(|p| PlayerInfo {
            id: p.id,
            first_name: p.first_name.unwrap_or_default(),
            last_name: p.last_name.unwrap_or_default(),
            team_id: p.team_id,
        })
        .collect();

    Ok(metadata)
}

pub fn read_metadata(match_id: &str, path: &Path) -> Result<MatchMetadata> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;
    parse_metadata_json(match_id, &json)
}

/// Assemble a [`MatchData`] from a tracking JSONL file and a match JSON file.
pub fn load_match_files(
    match_id: &str,
    tracking_path: &Path,
    metadata_path: &Path,
) -> Result<(MatchData, IngestStats)> {
    let metadata = read_metadata(match_id, metadata_path)?;
    let (tables, stats) = read_tracking_jsonl(tracking_path)?;
    log::info!(
        "ingested match {}: {} frames, {} samples, {} possession records ({} frames without period)",
        match_id,
        stats.frames,
        stats.samples,
        stats.possession_records,
        stats.skipped_no_period
    );
    Ok((
        MatchData {
            metadata,
            tracking: tables.tracking,
            possession: tables.possession,
            ball: tables.ball,
        },
        stats,
    ))
}
