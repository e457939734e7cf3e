use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use worm_config::{load_world_state_from_path, render_world_state};
use worm_core::{PartitionPlan, RunReport, RunSettings, Simulation, TileBounds};
use worm_types::WorldState;

#[derive(Parser, Debug)]
#[command(name = "worm-cli")]
#[command(about = "Partitioned hex-edge worm simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulation and print the final state.
    Run {
        input: PathBuf,
        iterations: u64,
        #[arg(long, default_value_t = 1)]
        workers: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print how a grid is cut into tiles for a worker count.
    Plan {
        #[arg(long)]
        height: usize,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        workers: usize,
    },
    /// Check that a partitioned run ends in the same state as a single-worker run.
    Verify {
        input: PathBuf,
        iterations: u64,
        #[arg(long)]
        workers: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct WorkerTiles {
    rank: usize,
    area: usize,
    tiles: Vec<TileBounds>,
}

#[derive(Debug, Serialize)]
struct PlanSummary<'a> {
    plan: &'a PartitionPlan,
    vertical_rounds: usize,
    horizontal_rounds: usize,
    workers: Vec<WorkerTiles>,
}

#[derive(Debug, Serialize)]
struct VerifySummary {
    workers: usize,
    iterations: u64,
    single_worker_ticks: u64,
    partitioned_ticks: u64,
    matches: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            iterations,
            workers,
            format,
            out,
        } => run_command(&input, iterations, workers, format, out),
        Commands::Plan {
            height,
            width,
            workers,
        } => plan_command(height, width, workers),
        Commands::Verify {
            input,
            iterations,
            workers,
        } => verify_command(&input, iterations, workers),
    }
}

/// Logs go to stderr so stdout only ever carries the final state.
fn init_tracing() {
    let default_filter = if std::env::var_os("DEBUG").is_some() {
        "worm_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_owned()),
        )
        .init();
}

fn run_command(
    input: &Path,
    iterations: u64,
    workers: usize,
    format: OutputFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    let simulation = Simulation::new(RunSettings {
        workers,
        iterations,
    })?;
    let report = simulation.launch(|| load_world_state_from_path(input))?;

    let text = match format {
        OutputFormat::Text => format!(
            "{}Stepped iterations: {}",
            render_world_state(&report.state),
            report.completed_ticks
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };
    write_output(text, out)
}

fn plan_command(height: usize, width: usize, workers: usize) -> Result<()> {
    let plan = PartitionPlan::new(height, width, workers)?;
    let summary = PlanSummary {
        plan: &plan,
        vertical_rounds: plan.vertical_rounds(),
        horizontal_rounds: plan.horizontal_rounds(),
        workers: (0..workers)
            .map(|rank| WorkerTiles {
                rank,
                area: plan.area_for(rank),
                tiles: plan.tiles_for(rank).collect(),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn verify_command(input: &Path, iterations: u64, workers: usize) -> Result<()> {
    let initial = load_world_state_from_path(input)?;
    let single = run_with(initial.clone(), 1, iterations)?;
    let partitioned = run_with(initial, workers, iterations)?;

    let summary = VerifySummary {
        workers,
        iterations,
        single_worker_ticks: single.completed_ticks,
        partitioned_ticks: partitioned.completed_ticks,
        matches: single == partitioned,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if !summary.matches {
        bail!(
            "{workers}-worker run of {} diverged from the single-worker run",
            input.display()
        );
    }
    info!(workers, "partitioned run matches single-worker run");
    Ok(())
}

fn run_with(initial: WorldState, workers: usize, iterations: u64) -> Result<RunReport> {
    let report = Simulation::new(RunSettings {
        workers,
        iterations,
    })?
    .run(initial)
    .with_context(|| format!("run with {workers} workers failed"))?;
    Ok(report)
}

fn write_output(text: String, out: Option<PathBuf>) -> Result<()> {
    if let Some(path) = out {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating output directory {}", parent.display())
            })?;
        }
        fs::write(&path, text).with_context(|| format!("failed writing {}", path.display()))?;
        eprintln!("wrote output to {}", path.display());
    } else {
        println!("{text}");
    }
    Ok(())
}
