use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use treemerge::engine::dispatch::{
    BackendKind, Dispatcher, DispatcherConfig, JobRecord, JobStatus, RunMode, UnitOptions,
};
use treemerge::engine::errors::PlanError;
use treemerge::engine::plan::{
    Planner, PlannerConfig, Strictness, collect_rows, load_manifest, write_plan_files,
};
use treemerge::engine::schema::sweep::sweep_manifest;
use treemerge::engine::verify::Remediation;
use treemerge::logging;
use treemerge::shared::config::load_settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Merge each planned group into one output file.
    Merge,
    /// Merge with the column allow-list applied to the Events table.
    Skim,
    /// Compare output row counts against chained input row counts.
    Verify,
    /// Compute the schema fingerprint of every manifest file.
    Fingerprint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Local,
    Queue,
}

#[derive(Parser)]
#[command(name = "treemerge")]
#[command(about = "Schema-reconciling merge of columnar event-tree files", long_about = None)]
struct Args {
    /// Dataset manifest JSON: dataset name to ordered input file list
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for merged files
    #[arg(short, long)]
    dir: PathBuf,

    /// Where to write the dataset-to-outputs JSON (fingerprint mode writes
    /// the schema-hash map here instead)
    #[arg(short, long, default_value = "out_dummy.json")]
    output: PathBuf,

    /// Schema-hash map JSON (file path to fingerprint), used as the
    /// secondary group-by value for files with variable columns
    #[arg(short = 's', long)]
    hashes: Option<PathBuf>,

    /// JSON list of column names to keep (skim mode)
    #[arg(short = 'b', long)]
    branches: Option<PathBuf>,

    /// Target cumulative size of input files to merge, in MB
    #[arg(short = 'm', long)]
    merge_size: Option<u64>,

    /// Number of concurrent workers
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// What to do with each planned group
    #[arg(long, value_enum, default_value_t = Mode::Merge)]
    mode: Mode,

    /// Execution backend for dispatched jobs
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Retry budget for transient infrastructure failures (queue backend)
    #[arg(long)]
    retries: Option<u32>,

    /// Completion poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Print planned work without executing it
    #[arg(long)]
    dry: bool,

    /// Actually dispatch the planned jobs
    #[arg(long)]
    run: bool,

    /// Plan groups whose output already exists instead of skipping them
    #[arg(long)]
    force_check: bool,

    /// Proceed without a schema-hash map (merging may fail for files whose
    /// columns differ)
    #[arg(long)]
    no_hashes: bool,

    /// Abort planning when hash-map and manifest file counts disagree
    #[arg(long)]
    strict_hashes: bool,

    /// Remove outputs that fail verification (verify mode only)
    #[arg(long)]
    remove_bad: bool,

    /// Admit non-boolean zero-backfill into the Events table
    #[arg(long)]
    allow_non_bool: bool,

    /// Settings file (TOML; defaults to treemerge.toml next to the cwd)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    logging::init(&settings.logging)?;

    let manifest = load_manifest(&args.input).context("failed to load dataset manifest")?;

    if args.mode == Mode::Fingerprint {
        let report = sweep_manifest(&manifest);
        serde_json::to_writer_pretty(std::fs::File::create(&args.output)?, &report.map)?;
        println!(
            "Fingerprinted {} files ({} unavailable), map written to {}",
            report.map.len(),
            report.unavailable.len(),
            args.output.display()
        );
        return Ok(());
    }

    // Strict precondition instead of an interactive prompt: merging without
    // a hash map must be waived explicitly.
    let hashes = match &args.hashes {
        Some(path) => Some(
            treemerge::engine::plan::manifest::load_hash_map(path)
                .context("failed to load schema-hash map")?,
        ),
        None if args.no_hashes => {
            warn!(
                target: "treemerge",
                "No hash map provided; merging will fail for files with differing columns"
            );
            None
        }
        None => return Err(PlanError::HashMapRequired.into()),
    };

    let strictness = if args.strict_hashes {
        Strictness::Abort
    } else {
        Strictness::Warn
    };
    let rows = collect_rows(&manifest, hashes.as_ref(), strictness)?;

    let target_mb = args.merge_size.unwrap_or(settings.merge.target_size_mb);
    let planner = Planner::new(PlannerConfig {
        out_dir: std::fs::canonicalize(&args.dir).unwrap_or_else(|_| args.dir.clone()),
        target_bytes: target_mb * 1024 * 1024,
        force_existing: args.force_check || args.mode == Mode::Verify,
    });
    let plan = planner.plan(&rows);

    println!(
        "Prepared {} merge jobs\n   with {} files in total.",
        plan.jobs.len(),
        plan.job_file_count()
    );
    let job_log = write_plan_files(&plan, &args.output)?;
    println!(
        "Writing output paths to {}\nWriting job info to {}",
        args.output.display(),
        job_log.display()
    );

    if args.dry {
        for group in &plan.jobs {
            println!(
                "{} {} <- {} files, {} bytes",
                args.mode_str(),
                group.output.display(),
                group.inputs.len(),
                group.bytes
            );
        }
        return Ok(());
    }

    if !args.run {
        info!(target: "treemerge", "Planning only; pass --run to dispatch");
        return Ok(());
    }

    let run_mode = match args.mode {
        Mode::Merge => RunMode::Merge,
        Mode::Skim => RunMode::Skim,
        Mode::Verify => RunMode::Verify,
        Mode::Fingerprint => unreachable!("handled above"),
    };
    let backend = match args.backend {
        Some(Backend::Local) => BackendKind::Local,
        Some(Backend::Queue) => BackendKind::Queue,
        None => match settings.dispatch.backend.as_str() {
            "queue" => BackendKind::Queue,
            _ => BackendKind::Local,
        },
    };
    let dispatcher = Dispatcher::new(DispatcherConfig {
        backend,
        concurrency: args.concurrency.unwrap_or(settings.dispatch.concurrency),
        retries: args.retries.unwrap_or(settings.dispatch.retries),
        poll_interval: std::time::Duration::from_millis(
            args.poll_interval_ms
                .unwrap_or(settings.dispatch.poll_interval_ms),
        ),
        log_dir: PathBuf::from(&settings.logging.log_dir).join("jobs"),
    })?;

    let options = UnitOptions {
        branches: args.branches.clone(),
        allow_non_bool: args.allow_non_bool,
        fallback_settings: settings.merge.fallback_compression,
    };
    let records = dispatcher.run(run_mode, plan.jobs.clone(), options).await?;

    let run_log = args.output.with_file_name(format!(
        "{}_runlog.json",
        args.output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string())
    ));
    serde_json::to_writer_pretty(std::fs::File::create(&run_log)?, &records)?;

    let failed = summarize(run_mode, &records, args.remove_bad);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

impl Args {
    fn mode_str(&self) -> &'static str {
        match self.mode {
            Mode::Merge => "merge",
            Mode::Skim => "skim",
            Mode::Verify => "verify",
            Mode::Fingerprint => "fingerprint",
        }
    }
}

/// Prints the final summary and returns the number of failed (or
/// verification-failed) jobs.
fn summarize(mode: RunMode, records: &[JobRecord], remove_bad: bool) -> usize {
    let failed = records
        .iter()
        .filter(|r| r.status == JobStatus::Failed)
        .count();

    match mode {
        RunMode::Merge | RunMode::Skim => {
            let input_bytes: u64 = records.iter().filter_map(|r| r.input_bytes).sum();
            let output_bytes: u64 = records.iter().filter_map(|r| r.output_bytes).sum();
            let files: usize = records
                .iter()
                .filter(|r| r.status == JobStatus::Done)
                .map(|r| r.group.inputs.len())
                .sum();
            println!(
                "Merged {} files in {} jobs ({} failed)",
                files,
                records.len(),
                failed
            );
            println!("Sum of input files: {input_bytes} bytes");
            println!("Output files: {output_bytes} bytes");
            if input_bytes > 0 {
                println!(
                    "Fraction of original: {:.6}",
                    output_bytes as f64 / input_bytes as f64
                );
            }
            failed
        }
        RunMode::Verify => {
            let mut total_in = 0u64;
            let mut total_out = 0u64;
            let mut remediation = Remediation::default();
            for record in records {
                total_in += record.input_rows.unwrap_or(0);
                total_out += record.output_rows.unwrap_or(0);
                if record.verification_failed() {
                    println!(
                        "Job {} incomplete, {}/{} included.",
                        record.group.output.display(),
                        record.output_rows.unwrap_or(0),
                        record.input_rows.unwrap_or(0)
                    );
                    remediation.push(record.group.output.clone());
                }
            }
            println!("Total in = {total_in}, total out = {total_out}");
            if !remediation.is_empty() {
                println!("{} outputs failed verification:", remediation.len());
                for path in &remediation.bad {
                    println!("  {}", path.display());
                }
                if remove_bad {
                    let removed = remediation.remove_all();
                    println!("Removed {removed} bad outputs");
                }
            }
            remediation.len()
        }
    }
}
