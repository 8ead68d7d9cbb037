//! kinechain command-line front end.
//!
//! Provides three modes of operation:
//! - `resolve`: Load a segment set and print its build order
//! - `replay`: Pose a chain from a JSON-lines sample file, one JSON line out per sample
//! - `info`: Print workspace crate versions

use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use kinechain_chain::{CalibrationState, Chain, Sample};
use kinechain_core::EngineConfig;
use kinechain_spec::{SegmentSet, parse_file, presets, resolve_with_limit};

type AppResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Kinematic segment chains driven by orientation samples.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a segment set and print its build order.
    Resolve {
        #[command(flatten)]
        source: SegmentSource,

        /// Engine configuration (TOML).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Apply every sample of a JSON-lines file and print the resulting poses.
    Replay {
        #[command(flatten)]
        source: SegmentSource,

        /// JSON-lines file, one sample object per line.
        #[arg(long)]
        samples: PathBuf,

        /// Engine configuration (TOML).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Calibration state (JSON) to install before the first sample.
        #[arg(long)]
        calibration: Option<PathBuf>,
    },

    /// Print crate information.
    Info,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SegmentSource {
    /// Segment declarations (JSON object keyed by segment name).
    #[arg(short, long)]
    segments: Option<PathBuf>,

    /// Built-in segment set: human, knee or ankle.
    #[arg(short, long)]
    preset: Option<String>,
}

impl SegmentSource {
    fn load(&self, config: &EngineConfig) -> Result<SegmentSet, Box<dyn Error>> {
        match (&self.segments, &self.preset) {
            (Some(path), _) => Ok(parse_file(path)?),
            (None, Some(name)) => presets::by_name(name, config.joint_diameter).ok_or_else(|| {
                Box::<dyn Error>::from(format!(
                    "unknown preset {name:?} (expected one of {})",
                    presets::PRESET_NAMES.join(", ")
                ))
            }),
            (None, None) => Err("either --segments or --preset is required".into()),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let config = EngineConfig::from_file(path)?;
            info!("loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SegmentPose {
    position: [f64; 3],
    orientation: [f64; 4],
}

#[derive(Serialize)]
struct Frame<'a> {
    index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<String>,
    segments: BTreeMap<&'a str, SegmentPose>,
}

fn frame(index: usize, missing: Vec<String>, chain: &Chain) -> Frame<'_> {
    let segments = chain
        .nodes()
        .iter()
        .map(|n| {
            let p = n.position();
            (
                n.name(),
                SegmentPose {
                    position: [p.x, p.y, p.z],
                    orientation: n.orientation().to_array(),
                },
            )
        })
        .collect();
    Frame {
        index,
        missing,
        segments,
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_resolve(source: &SegmentSource, config: Option<&Path>) -> AppResult {
    let config = load_config(config)?;
    let set = source.load(&config)?;
    let order = resolve_with_limit(&set, config.iteration_limit(set.len()))?;

    println!("{} segments, roots: {}", order.len(), order.roots().join(", "));
    for (i, name) in order.iter().enumerate() {
        let parent = set.get(name).map_or("?", |s| s.parent.as_str());
        println!("{:>3}  {name:<20} <- {parent}", i + 1);
    }
    Ok(())
}

fn run_replay(
    source: &SegmentSource,
    samples: &Path,
    config: Option<&Path>,
    calibration: Option<&Path>,
) -> AppResult {
    let config = load_config(config)?;
    let set = source.load(&config)?;
    let mut chain = Chain::build_with_config(&set, &config)?;

    if let Some(path) = calibration {
        let state: CalibrationState = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        chain.set_calibration(state)?;
        info!("loaded calibration for {} segments", chain.calibration().len());
    }

    let reader = BufReader::new(File::open(samples)?);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut applied = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample = match Sample::from_json_str(&line) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("line {}: {e}, skipped", line_no + 1);
                continue;
            }
        };
        let report = chain.apply_sample(&sample);
        serde_json::to_writer(&mut out, &frame(applied, report.missing, &chain))?;
        writeln!(out)?;
        applied += 1;
    }
    out.flush()?;

    info!("replayed {applied} samples through {} segments", chain.len());
    Ok(())
}

/// Library crates linked into this binary, with the version each was
/// built from.
fn crate_versions() -> [(&'static str, &'static str); 3] {
    [
        ("kinechain-core", kinechain_core::VERSION),
        ("kinechain-spec", kinechain_spec::VERSION),
        ("kinechain-chain", kinechain_chain::VERSION),
    ]
}

fn run_info() {
    println!("kinechain v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    for (name, version) in crate_versions() {
        println!("  {name:<15} {version}");
    }
    println!();
    println!("presets: {}", presets::PRESET_NAMES.join(", "));
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve { source, config } => run_resolve(&source, config.as_deref()),
        Commands::Replay {
            source,
            samples,
            config,
            calibration,
        } => run_replay(&source, &samples, config.as_deref(), calibration.as_deref()),
        Commands::Info => {
            run_info();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_versions_come_from_each_library() {
        let versions = crate_versions();
        assert_eq!(versions[0], ("kinechain-core", kinechain_core::VERSION));
        assert_eq!(versions[1], ("kinechain-spec", kinechain_spec::VERSION));
        assert_eq!(versions[2], ("kinechain-chain", kinechain_chain::VERSION));
        assert!(versions.iter().all(|(_, v)| !v.is_empty()));
    }
}
