//! Space Creation CLI
//!
//! Import provider files into the match store, verify entries and run the
//! off-ball run analysis over stored matches.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "sc_cache")]
#[command(author, version, about = "Off-ball run space-creation analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a match from tracking JSONL and match JSON files
    Import {
        #[arg(long)]
        match_id: String,

        /// Tracking JSONL file (one frame per line)
        #[arg(long)]
        tracking: PathBuf,

        /// Match metadata JSON file
        #[arg(long)]
        metadata: PathBuf,

        /// Store directory
        #[arg(long)]
        store: PathBuf,
    },

    /// Analyze stored matches and print the batch summary
    Analyze {
        /// Store directory
        #[arg(long)]
        store: PathBuf,

        /// Match ids to analyze (default: every stored match)
        #[arg(long = "match-id")]
        match_ids: Vec<String>,

        /// YAML analysis config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset profile (default, strict, lenient)
        #[arg(long)]
        profile: Option<String>,

        /// Trajectory CSV output
        #[arg(long)]
        out: Option<PathBuf>,

        /// Player statistics CSV output
        #[arg(long)]
        players_out: Option<PathBuf>,

        /// Run-frame CSV output (one row per measured frame)
        #[arg(long)]
        frames_out: Option<PathBuf>,

        /// Analyze matches in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Verify the checksum of stored matches
    Verify {
        /// Store directory
        #[arg(long)]
        store: PathBuf,

        /// Match ids to verify (default: every stored match)
        #[arg(long = "match-id")]
        match_ids: Vec<String>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Import {
            match_id,
            tracking,
            metadata,
            store,
        } => run_import(&match_id, &tracking, &metadata, &store),
        Commands::Analyze {
            store,
            match_ids,
            config,
            profile,
            out,
            players_out,
            frames_out,
            parallel,
        } => {
            let mut config = load_config(config.as_deref(), profile.as_deref())?;
            config.parallel |= parallel;
            let outputs = AnalyzeOutputs {
                trajectories: out.as_deref(),
                players: players_out.as_deref(),
                frames: frames_out.as_deref(),
            };
            run_analyze(&store, match_ids, &config, &outputs)
        }
        Commands::Verify { store, match_ids } => run_verify(&store, match_ids),
    }
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&Path>, profile: Option<&str>) -> Result<sc_core::AnalysisConfig> {
    use sc_core::AnalysisConfig;

    match (path, profile) {
        (Some(path), _) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Ok(AnalysisConfig::from_yaml_str(&yaml)?)
        }
        (None, Some(profile)) => Ok(AnalysisConfig::from_profile(profile)),
        (None, None) => Ok(AnalysisConfig::from_env_or_default()),
    }
}

#[cfg(feature = "cli")]
fn run_import(match_id: &str, tracking: &Path, metadata: &Path, store: &Path) -> Result<()> {
    tracing::info!("importing match {}", match_id);
    let (data, stats) = sc_cache::load_match_files(match_id, tracking, metadata)?;
    let store = sc_cache::MatchStore::open(store)?;
    let meta = store.put(&data)?;

    println!("\n✅ Match {} imported", match_id);
    println!(
        "   Frames:          {} ({} without period, {} without timestamp)",
        stats.frames, stats.skipped_no_period, stats.skipped_no_timestamp
    );
    println!("   Samples:         {}", stats.samples);
    println!("   Possession rows: {}", stats.possession_records);
    print_entry(&meta);
    Ok(())
}

#[cfg(feature = "cli")]
fn print_entry(meta: &sc_cache::EntryMetadata) {
    println!(
        "   Original size:   {} bytes ({:.2} KB)",
        meta.original_size,
        meta.original_size as f64 / 1024.0
    );
    println!(
        "   Compressed size: {} bytes ({:.2} KB)",
        meta.compressed_size,
        meta.compressed_size as f64 / 1024.0
    );
    println!("   Compression:     {:.1}%", meta.compression_ratio * 100.0);
    println!("   Checksum:        {}", meta.checksum);
    println!("   Created:         {}", meta.created_at);
}

#[cfg(feature = "cli")]
fn run_verify(store: &Path, match_ids: Vec<String>) -> Result<()> {
    let store = sc_cache::MatchStore::open(store)?;
    let ids = if match_ids.is_empty() { store.list()? } else { match_ids };

    let mut failed = 0;
    for id in &ids {
        match store.verify(id) {
            Ok(meta) => println!("✅ {} ({})", id, meta.checksum),
            Err(e) => {
                failed += 1;
                println!("❌ {}: {}", id, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} entries failed verification", failed, ids.len());
    }
    Ok(())
}

/// Optional CSV outputs of `analyze`.
#[cfg(feature = "cli")]
struct AnalyzeOutputs<'a> {
    trajectories: Option<&'a Path>,
    players: Option<&'a Path>,
    frames: Option<&'a Path>,
}

#[cfg(feature = "cli")]
fn create_output(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path).with_context(|| format!("Failed to create output file: {}", path.display()))
}

#[cfg(feature = "cli")]
fn run_analyze(
    store: &Path,
    match_ids: Vec<String>,
    config: &sc_core::AnalysisConfig,
    outputs: &AnalyzeOutputs<'_>,
) -> Result<()> {
    use sc_core::analysis::summary::MIN_RUNS_FOR_EFFICIENCY;
    use sc_core::{player_stats, BatchSummary, PlayerDirectory, TopPerformers};

    let store = sc_cache::MatchStore::open(store)?;
    let ids = if match_ids.is_empty() { store.list()? } else { match_ids };
    if ids.is_empty() {
        anyhow::bail!("No matches to analyze");
    }

    let report = sc_core::analyze_matches(&ids, &store, config)?;
    for failure in &report.failures {
        tracing::warn!("match {} failed: {}", failure.match_id, failure.message);
    }

    let summary = BatchSummary::from_trajectories(
        &report.trajectories,
        report.match_count(),
        config.pitch.area(),
        config.frame_rate_hz,
    );
    print_summary(&summary);

    let stats = player_stats(&report.trajectories);
    let directory = PlayerDirectory::from_metadata(&report.analyzed);
    let top = TopPerformers::select(&stats, MIN_RUNS_FOR_EFFICIENCY);
    println!("\n{}", "=".repeat(80));
    println!("TOP PERFORMERS");
    println!("{}", "=".repeat(80));
    print_performer("MOST RUNS/MATCH", top.most_runs_per_match.as_ref(), &directory);
    print_performer("MOST SPACE/MATCH", top.most_space_per_match.as_ref(), &directory);
    print_performer(
        &format!("MOST EFFICIENT (min {} runs)", MIN_RUNS_FOR_EFFICIENCY),
        top.most_efficient.as_ref(),
        &directory,
    );

    if let Some(path) = outputs.trajectories {
        sc_cache::write_trajectories_file(path, &report.trajectories, config.frame_rate_hz)?;
        println!("\n📄 Trajectories saved to: {}", path.display());
    }
    if let Some(path) = outputs.players {
        sc_cache::write_player_stats(create_output(path)?, &stats, &directory)?;
        println!("📄 Player statistics saved to: {}", path.display());
    }
    if let Some(path) = outputs.frames {
        sc_cache::write_batch_run_frames(create_output(path)?, &report.run_frames)?;
        println!("📄 Run frames saved to: {}", path.display());
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(summary: &sc_core::BatchSummary) {
    println!("\n{}", "=".repeat(80));
    println!("RESULTS");
    println!("{}", "=".repeat(80));
    println!("\nMatches analyzed: {}", summary.match_count);
    println!("Total runs: {}", summary.total_runs);
    println!("Average runs per match: {:.1}", summary.runs_per_match);
    println!("\nTotal space created: {:.0} m²", summary.total_space_created);
    println!("Average space per run: {:.0} m²", summary.mean_space_per_run);
    println!("Percentage of pitch: {:.1}%", summary.mean_space_pct_of_pitch);
    println!(
        "\nAverage peak speed: {:.2} m/s ({:.1} km/h)",
        summary.mean_peak_speed_mps, summary.mean_peak_speed_kmh
    );
    println!(
        "Average duration: {:.1} seconds ({:.1} frames)",
        summary.mean_duration_s, summary.mean_duration_frames
    );
}

#[cfg(feature = "cli")]
fn print_performer(title: &str, stats: Option<&sc_core::PlayerRunStats>, directory: &sc_core::PlayerDirectory) {
    let Some(s) = stats else {
        println!("\n{}: not enough data", title);
        return;
    };
    let label = directory.label(s.entity_id);
    println!("\n{}: {} ({})", title, label.name, label.team);
    println!(
        "   {:.1} runs/match ({} runs in {} matches) | {:.0} m²/match | {:.0} m²/run",
        s.runs_per_match, s.runs, s.matches_played, s.space_per_match, s.mean_space_per_run
    );
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("sc_cache CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
