//! xamsim CLI
//!
//! Clusters simulated detector hits and writes per-cluster rows.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use xamsim_algorithms::{ClusteringConfig, EventProcessor, MergeStrategy, RunSummary};
use xamsim_core::thresholds::ThresholdPair;
use xamsim_io::{
    read_hit_stream, ClusterRowWriter, EventWriter, GeometryConfig, RowFormat, SummaryWriter,
};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] xamsim_io::Error),
}

/// Merge pass selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Merge {
    /// One forward sweep over cluster pairs
    SingleSweep,
    /// Repeat sweeps until no pair is close enough
    Transitive,
}

impl From<Merge> for MergeStrategy {
    fn from(merge: Merge) -> Self {
        match merge {
            Merge::SingleSweep => Self::SingleSweep,
            Merge::Transitive => Self::Transitive,
        }
    }
}

/// Hit clustering for xenon detector simulations.
#[derive(Parser)]
#[command(name = "xamsim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a hit stream and write one row per cluster
    Cluster {
        /// Input hit stream (JSON lines)
        input: PathBuf,

        /// Geometry file listing the active volumes
        #[arg(short, long)]
        geometry: PathBuf,

        /// Output file path (.csv or .bin)
        #[arg(short, long)]
        output: PathBuf,

        /// Default spatial threshold (mm)
        #[arg(long, value_parser = non_negative)]
        spatial_threshold: Option<f64>,

        /// Default time threshold (ns)
        #[arg(long, value_parser = non_negative)]
        time_threshold: Option<f64>,

        /// Merge pass to run after assignment
        #[arg(long, value_enum, default_value = "single-sweep")]
        merge: Merge,

        /// Per-collection summary CSV
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Per-event CSV (weight, type, primary vertex)
        #[arg(long)]
        events: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about a hit stream
    Info {
        /// Input hit stream (JSON lines)
        input: PathBuf,
    },

    /// Print the threshold table a geometry resolves to
    Thresholds {
        /// Geometry file listing the active volumes
        #[arg(short, long)]
        geometry: PathBuf,
    },
}

fn non_negative(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a non-negative number"))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Commands::Cluster { verbose: true, .. });
    init_logging(verbose);

    match cli.command {
        Commands::Cluster {
            input,
            geometry,
            output,
            spatial_threshold,
            time_threshold,
            merge,
            summary,
            events,
            verbose: _,
        } => {
            let mut default = ThresholdPair::default();
            if let Some(spatial) = spatial_threshold {
                default.spatial_mm = spatial;
            }
            if let Some(time) = time_threshold {
                default.time_ns = time;
            }
            let extra = ExtraOutputs {
                summary: summary.as_deref(),
                events: events.as_deref(),
            };
            run_cluster(&input, &geometry, &output, default, merge, &extra)?;
        }

        Commands::Info { input } => print_info(&input)?,

        Commands::Thresholds { geometry } => {
            let setup = GeometryConfig::load(&geometry)?.detector_setup(ThresholdPair::default())?;
            let default = setup.thresholds.default_pair();
            println!("{:<4} | {:<24} | {:>12} | {:>10}", "id", "collection", "spatial (mm)", "time (ns)");
            println!("{:-<60}", "");
            for (id, name) in setup.registry.iter() {
                let pair = setup.thresholds.resolve(name);
                println!(
                    "{:<4} | {:<24} | {:>12} | {:>10}",
                    id, name, pair.spatial_mm, pair.time_ns
                );
            }
            println!(
                "{:<4} | {:<24} | {:>12} | {:>10}",
                "-", "(default)", default.spatial_mm, default.time_ns
            );
        }
    }

    Ok(())
}

/// Optional files written next to the cluster rows.
struct ExtraOutputs<'a> {
    summary: Option<&'a Path>,
    events: Option<&'a Path>,
}

fn run_cluster(
    input: &Path,
    geometry: &Path,
    output: &Path,
    default: ThresholdPair,
    merge: Merge,
    extra: &ExtraOutputs<'_>,
) -> Result<()> {
    let setup = GeometryConfig::load(geometry)?.detector_setup(default)?;
    info!(
        "{} sensitive collections, default thresholds {} mm / {} ns, merge {:?}",
        setup.registry.len(),
        default.spatial_mm,
        default.time_ns,
        merge
    );

    let start = Instant::now();
    let events = read_hit_stream(input)?;
    debug!("read {} events in {:.2?}", events.len(), start.elapsed());

    let config = ClusteringConfig::new().with_merge_strategy(merge.into());
    let processor = EventProcessor::new(setup.registry, setup.thresholds, config);
    let records = processor.process_events(&events);

    let format = RowFormat::from_path(output);
    let mut writer = ClusterRowWriter::create(output, format)?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    info!(
        "wrote {} rows to {} ({:?})",
        writer.rows_written(),
        output.display(),
        format
    );

    if let Some(path) = extra.summary {
        let mut summary_writer = SummaryWriter::create(path)?;
        for record in &records {
            summary_writer.write_record(record)?;
        }
        summary_writer.flush()?;
        info!("wrote collection summaries to {}", path.display());
    }

    if let Some(path) = extra.events {
        let mut event_writer = EventWriter::create(path)?;
        for record in &records {
            event_writer.write_record(record)?;
        }
        event_writer.flush()?;
        info!("wrote event rows to {}", path.display());
    }

    let run: RunSummary = records.iter().collect();
    println!(
        "Processed {} events in {:.2}s",
        run.events,
        start.elapsed().as_secs_f64()
    );
    println!("Total hits: {}", run.hits);
    println!("Total clusters: {}", run.clusters);
    println!("Events with clusters: {}", run.events_with_clusters);
    println!("Deposited energy: {:.3} keV", run.energy_kev);
    Ok(())
}

#[derive(Default)]
struct CollectionInfo {
    hits: usize,
    time_range: Option<(f64, f64)>,
    energy_kev: f64,
}

fn print_info(input: &Path) -> Result<()> {
    let events = read_hit_stream(input)?;
    let mut collections: BTreeMap<&str, CollectionInfo> = BTreeMap::new();
    for event in &events {
        for (name, hits) in &event.collections {
            let entry = collections.entry(name.as_str()).or_default();
            entry.hits += hits.len();
            for hit in hits {
                entry.energy_kev += hit.energy_deposit;
                entry.time_range = Some(match entry.time_range {
                    Some((lo, hi)) => (lo.min(hit.time), hi.max(hit.time)),
                    None => (hit.time, hit.time),
                });
            }
        }
    }

    println!("File: {}", input.display());
    println!("Events: {}", events.len());
    for (name, info) in &collections {
        println!("{}:", name);
        println!("  Hits: {}", info.hits);
        println!("  Deposited energy: {:.3} keV", info.energy_kev);
        if let Some((lo, hi)) = info.time_range {
            println!("  Time range: {} - {} ns", lo, hi);
        }
    }
    Ok(())
}
