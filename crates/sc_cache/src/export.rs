//! CSV export of analysis results for report and plotting tools.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use sc_core::{MatchRunFrames, PlayerDirectory, PlayerRunStats, RunFrameRecord, Trajectory};
use serde::Serialize;

/// Flat trajectory row; the run id is rendered as `"{entity}_{sequence}"`.
#[derive(Debug, Serialize)]
struct TrajectoryRow<'a> {
    run_id: String,
    match_id: Option<&'a str>,
    period: Option<u8>,
    player_id: u32,
    team: &'static str,
    start_frame: u32,
    end_frame: u32,
    duration_frames: u32,
    duration_s: f64,
    start_x: f64,
    start_y: f64,
    end_x: f64,
    end_y: f64,
    max_velocity: f64,
    total_space_created: f64,
}

impl<'a> TrajectoryRow<'a> {
    fn new(t: &'a Trajectory, frame_rate_hz: f64) -> Self {
        Self {
            run_id: t.run_id.to_string(),
            match_id: t.match_id.as_deref(),
            period: t.period,
            player_id: t.entity_id,
            team: t.team.as_str(),
            start_frame: t.start_frame,
            end_frame: t.end_frame,
            duration_frames: t.duration_frames,
            duration_s: t.duration_seconds(frame_rate_hz),
            start_x: t.start_x,
            start_y: t.start_y,
            end_x: t.end_x,
            end_y: t.end_y,
            max_velocity: t.max_speed,
            total_space_created: t.total_space_created,
        }
    }
}

pub fn write_trajectories<W: Write>(writer: W, trajectories: &[Trajectory], frame_rate_hz: f64) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for t in trajectories {
        csv.serialize(TrajectoryRow::new(t, frame_rate_hz))
            .context("Failed to write trajectory row")?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_run_frames<W: Write>(writer: W, records: &[RunFrameRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record).context("Failed to write run-frame row")?;
    }
    csv.flush()?;
    Ok(())
}

/// Run-frame row of a batch export, prefixed with its match.
#[derive(Debug, Serialize)]
struct BatchRunFrameRow<'a> {
    match_id: &'a str,
    frame: u32,
    period: u8,
    entity_id: u32,
    possessor_id: u32,
    team: &'static str,
    speed: f64,
    space_created: f64,
    beneficiaries: u32,
    detected: bool,
    x: f64,
    y: f64,
}

/// Run frames of several matches in one table, for heatmap tools.
pub fn write_batch_run_frames<W: Write>(writer: W, matches: &[MatchRunFrames]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for m in matches {
        for r in &m.records {
            csv.serialize(BatchRunFrameRow {
                match_id: &m.match_id,
                frame: r.frame,
                period: r.period,
                entity_id: r.entity_id,
                possessor_id: r.possessor_id,
                team: r.team.as_str(),
                speed: r.speed,
                space_created: r.space_created,
                beneficiaries: r.beneficiaries,
                detected: r.detected,
                x: r.x,
                y: r.y,
            })
            .context("Failed to write run-frame row")?;
        }
    }
    csv.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct PlayerRow<'a> {
    player_id: u32,
    name: &'a str,
    team: &'a str,
    num_runs: u32,
    total_space: f64,
    avg_space_per_run: f64,
    matches_played: u32,
    runs_per_match: f64,
    space_per_match: f64,
}

pub fn write_player_stats<W: Write>(
    writer: W,
    stats: &[PlayerRunStats],
    directory: &PlayerDirectory,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for s in stats {
        let label = directory.label(s.entity_id);
        csv.serialize(PlayerRow {
            player_id: s.entity_id,
            name: &label.name,
            team: &label.team,
            num_runs: s.runs,
            total_space: s.total_space,
            avg_space_per_run: s.mean_space_per_run,
            matches_played: s.matches_played,
            runs_per_match: s.runs_per_match,
            space_per_match: s.space_per_match,
        })
        .context("Failed to write player row")?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_trajectories_file(path: &Path, trajectories: &[Trajectory], frame_rate_hz: f64) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_trajectories(file, trajectories, frame_rate_hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_core::{RunId, TeamSide};

    fn trajectory() -> Trajectory {
        Trajectory {
            run_id: RunId { entity_id: 9, sequence: 2 },
            entity_id: 9,
            team: TeamSide::Away,
            start_frame: 120,
            end_frame: 134,
            duration_frames: 15,
            start_x: -12.5,
            start_y: 3.0,
            end_x: -4.0,
            end_y: 8.5,
            max_speed: 7.25,
            total_space_created: 42.0,
            match_id: Some("2011166".into()),
            period: Some(2),
        }
    }

    #[test]
    fn test_trajectory_csv() -> Result<()> {
        let mut out = Vec::new();
        write_trajectories(&mut out, &[trajectory()], 10.0)?;
        let text = String::from_utf8(out)?;
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("run_id,match_id,period,player_id,team"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("9_2,2011166,2,9,away,120,134,15,1.5,"), "row: {row}");
        assert!(lines.next().is_none());
        Ok(())
    }

    #[test]
    fn test_run_frame_csv() -> Result<()> {
        let record = RunFrameRecord {
            frame: 50,
            period: 1,
            entity_id: 4,
            possessor_id: 7,
            team: TeamSide::Home,
            speed: 6.5,
            space_created: 15.0,
            beneficiaries: 1,
            detected: true,
            x: 10.0,
            y: -3.0,
        };
        let mut out = Vec::new();
        write_run_frames(&mut out, &[record])?;
        let text = String::from_utf8(out)?;
        assert!(text.starts_with("frame,period,entity_id,possessor_id,team,speed,space_created"));
        assert!(text.contains("50,1,4,7,home,6.5,15.0,1,true,10.0,-3.0"));
        Ok(())
    }

    #[test]
    fn test_batch_run_frame_csv_tags_matches() -> Result<()> {
        let record = |frame| RunFrameRecord {
            frame,
            period: 2,
            entity_id: 4,
            possessor_id: 7,
            team: TeamSide::Away,
            speed: 5.5,
            space_created: 3.0,
            beneficiaries: 2,
            detected: false,
            x: 1.0,
            y: 2.0,
        };
        let matches = vec![
            MatchRunFrames {
                match_id: "m1".into(),
                records: vec![record(10), record(11)],
            },
            MatchRunFrames {
                match_id: "m2".into(),
                records: vec![],
            },
            MatchRunFrames {
                match_id: "m3".into(),
                records: vec![record(99)],
            },
        ];
        let mut out = Vec::new();
        write_batch_run_frames(&mut out, &matches)?;
        let text = String::from_utf8(out)?;
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4, "header plus three rows");
        assert!(lines[0].starts_with("match_id,frame,period,entity_id"));
        assert_eq!(lines[1], "m1,10,2,4,7,away,5.5,3.0,2,false,1.0,2.0");
        assert!(lines[3].starts_with("m3,99,"));
        Ok(())
    }

    #[test]
    fn test_player_csv_uses_directory_fallback() -> Result<()> {
        let stats = sc_core::player_stats(&[trajectory()]);
        let mut out = Vec::new();
        write_player_stats(&mut out, &stats, &PlayerDirectory::new())?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("9,Player 9,Unknown,1,42.0"));
        Ok(())
    }
}
