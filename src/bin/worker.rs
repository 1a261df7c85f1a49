use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use treemerge::engine::dispatch::{JobStatus, RunMode, UnitOptions, WorkUnit, execute_unit};
use treemerge::engine::plan::MergeGroup;
use treemerge::engine::store::format::FALLBACK_COMPRESSION;
use treemerge::logging;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum WorkerMode {
    Merge,
    Skim,
    Verify,
}

/// Runs exactly one unit of work. The queue backend submits one of these
/// per merge group and parses the final stdout line: row counts for verify,
/// byte counts for merge and skim. Logs go to stderr.
#[derive(Parser)]
#[command(name = "treemerge-worker")]
#[command(about = "Run one merge, skim or verify unit", long_about = None)]
struct Args {
    #[arg(long, value_enum)]
    mode: WorkerMode,

    /// Output file for this unit
    #[arg(long)]
    out: PathBuf,

    /// JSON list of column names to keep (skim mode)
    #[arg(long)]
    branches: Option<PathBuf>,

    /// Admit non-boolean zero-backfill into the Events table
    #[arg(long)]
    allow_non_bool: bool,

    /// Compression settings forced when inputs disagree
    #[arg(long, default_value_t = FALLBACK_COMPRESSION)]
    fallback: u32,

    /// Input files, merged in the given order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_stderr("info")?;

    let mode = match args.mode {
        WorkerMode::Merge => RunMode::Merge,
        WorkerMode::Skim => RunMode::Skim,
        WorkerMode::Verify => RunMode::Verify,
    };
    let unit = WorkUnit {
        mode,
        group: MergeGroup {
            dataset: String::new(),
            group_key: String::new(),
            ordinal: 0,
            output: args.out,
            inputs: args.inputs,
            bytes: 0,
        },
        options: UnitOptions {
            branches: args.branches,
            allow_non_bool: args.allow_non_bool,
            fallback_settings: args.fallback,
        },
    };

    let outcome = execute_unit(&unit);
    match outcome.status {
        JobStatus::Done => {
            match mode {
                RunMode::Verify => println!(
                    "{} {}",
                    outcome.output_rows.unwrap_or(0),
                    outcome.input_rows.unwrap_or(0)
                ),
                RunMode::Merge | RunMode::Skim => println!(
                    "{} {}",
                    outcome.output_bytes.unwrap_or(0),
                    outcome.input_bytes.unwrap_or(0)
                ),
            }
            Ok(())
        }
        _ => {
            eprintln!(
                "unit failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            );
            std::process::exit(1);
        }
    }
}
