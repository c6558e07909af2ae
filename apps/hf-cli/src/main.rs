use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hf_core::Status;
use hf_engine::{Callbacks, Instance};
use hf_models::ReferenceModel;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod runner;

use config::{ExperimentConfig, RunKind};
use error::CliResult;

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "Hybrid FMU CLI - run reference models as co-simulation or model-exchange instances", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled reference models
    List,
    /// Print a model description
    Describe {
        /// Model name
        model: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
    /// Run an experiment and print CSV
    Run {
        /// Experiment YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Model name (overrides the file)
        #[arg(long)]
        model: Option<String>,
        /// Interface kind (overrides the file)
        #[arg(long, value_enum)]
        kind: Option<RunKind>,
        /// Communication / host step in seconds
        #[arg(long)]
        step: Option<f64>,
        /// Stop time in seconds
        #[arg(long)]
        stop: Option<f64>,
        /// Forward OK-level host messages
        #[arg(long)]
        debug_logging: bool,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            for name in ReferenceModel::NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Describe { model, format } => cmd_describe(&model, format),
        Commands::Run {
            config,
            model,
            kind,
            step,
            stop,
            debug_logging,
            output,
        } => {
            let mut experiment = match config {
                Some(path) => ExperimentConfig::load(&path)?,
                None => ExperimentConfig::default(),
            };
            if let Some(model) = model {
                experiment.model = model;
            }
            if let Some(kind) = kind {
                experiment.kind = kind;
            }
            if let Some(step) = step {
                experiment.step_size = step;
            }
            if let Some(stop) = stop {
                experiment.stop_time = stop;
            }
            experiment.debug_logging |= debug_logging;
            experiment.validate()?;
            cmd_run(&experiment, output)
        }
    }
}

fn cmd_describe(model: &str, format: Format) -> CliResult<()> {
    let desc = ReferenceModel::by_name(model)?.description();
    let text = match format {
        Format::Yaml => serde_yaml::to_string(&desc)?,
        Format::Json => serde_json::to_string_pretty(&desc)?,
    };
    println!("{text}");
    Ok(())
}

fn cmd_run(experiment: &ExperimentConfig, output: Option<PathBuf>) -> CliResult<()> {
    let model = ReferenceModel::by_name(&experiment.model)?;
    let sink = |name: &str, status: Status, category: &str, message: &str| {
        eprintln!("[{name}] {status} ({category}): {message}");
    };
    let mut inst = Instance::instantiate(
        experiment.model.clone(),
        experiment.kind.into(),
        model.description(),
        model,
        Callbacks::new(sink),
        experiment.debug_logging,
    )?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let summary = runner::run(&mut inst, experiment, &mut out)?;
    out.flush()?;
    inst.free_instance();

    eprintln!(
        "✓ {} rows to t={:.3}s ({} events, {} internal steps)",
        summary.rows, summary.final_time, summary.events, summary.solver_steps
    );
    Ok(())
}
