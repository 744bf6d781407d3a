//! CointLab CLI — analyze, batch, generate and config commands.
//!
//! Commands:
//! - `analyze` — run the pipeline on one JSON or CSV request
//! - `batch` — analyze many files in parallel, one result document each
//! - `generate` — emit a synthetic request for a named scenario
//! - `config` — print the effective pipeline configuration as TOML
//!
//! Results go to stdout as JSON. Request and analysis failures are printed as
//! `{"error": CODE, "message": ...}` and exit with status 1. Logs go to
//! stderr, filtered by `RUST_LOG`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cointlab_core::Scenario;
use cointlab_runner::{
    load_request, run_files, AnalysisObserver, AnalysisRequest, Analyzer, ConfigError,
    ErrorResponse, Oracles, PipelineConfig, RecordingObserver, RequestError, Tee, TracingObserver,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cointlab",
    about = "CointLab CLI — automated integration-order, cointegration and regression analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one request. Reads JSON from stdin when no file is given.
    Analyze {
        /// JSON or CSV file; `-` or absent reads stdin.
        input: Option<PathBuf>,

        /// Input encoding when reading stdin.
        #[arg(long, value_enum, default_value_t = StdinFormat::Json)]
        format: StdinFormat,

        /// CSV columns to analyze, in order (comma-separated).
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Index of the target series; overrides the request and keyword matching.
        #[arg(long, allow_hyphen_values = true)]
        target: Option<i64>,

        /// Pipeline config TOML. Defaults apply to missing fields.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the result.
        #[arg(long, default_value_t = false)]
        pretty: bool,

        /// Write the decision trace as JSON lines to this file.
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Analyze many files in parallel.
    Batch {
        /// JSON or CSV request files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory receiving `<stem>.result.json` per input.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Pipeline config TOML.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads. Defaults to one per core.
        #[arg(long)]
        threads: Option<usize>,

        /// Pretty-print result documents.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Emit a synthetic request as JSON.
    Generate {
        #[arg(long, value_enum, default_value_t = ScenarioArg::Cointegrated)]
        scenario: ScenarioArg,

        #[arg(long, default_value_t = 200)]
        length: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the effective configuration as TOML.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StdinFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioArg {
    WhiteNoise,
    RandomWalk,
    Cointegrated,
    LevelShift,
    Mixed,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::WhiteNoise => Scenario::WhiteNoise,
            ScenarioArg::RandomWalk => Scenario::RandomWalk,
            ScenarioArg::Cointegrated => Scenario::Cointegrated,
            ScenarioArg::LevelShift => Scenario::LevelShift,
            ScenarioArg::Mixed => Scenario::Mixed,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Analyze {
            input,
            format,
            columns,
            target,
            config,
            pretty,
            trace,
        } => run_analyze(
            input.as_deref(),
            format,
            columns.as_deref(),
            target,
            config.as_deref(),
            pretty,
            trace.as_deref(),
        ),
        Commands::Batch {
            inputs,
            output_dir,
            config,
            threads,
            pretty,
        } => run_batch(&inputs, &output_dir, config.as_deref(), threads, pretty),
        Commands::Generate {
            scenario,
            length,
            seed,
        } => run_generate(scenario.into(), length, seed),
        Commands::Config { config } => run_config(config.as_deref()),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> std::result::Result<PipelineConfig, ConfigError> {
    match path {
        Some(p) => PipelineConfig::from_file(p),
        None => Ok(PipelineConfig::default()),
    }
}

fn config_failure(e: &ConfigError) -> ErrorResponse {
    ErrorResponse::new(e.code(), e.to_string())
}

/// Print a failure document and signal exit status 1.
fn report_failure(response: ErrorResponse) -> Result<ExitCode> {
    println!("{}", serde_json::to_string(&response)?);
    Ok(ExitCode::FAILURE)
}

fn read_request(
    input: Option<&Path>,
    format: StdinFormat,
    columns: Option<&[String]>,
) -> Result<std::result::Result<AnalysisRequest, ErrorResponse>> {
    if let Some(path) = input.filter(|p| *p != Path::new("-")) {
        return Ok(load_request(path, columns).map_err(|e| ErrorResponse::from(&e)));
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    let parsed = match format {
        StdinFormat::Json => AnalysisRequest::from_json(&buf),
        StdinFormat::Csv if buf.trim().is_empty() => Err(RequestError::NoInput),
        StdinFormat::Csv => AnalysisRequest::from_csv_reader(buf.as_bytes(), columns),
    };
    Ok(parsed.map_err(|e| ErrorResponse::from(&e)))
}

fn run_analyze(
    input: Option<&Path>,
    format: StdinFormat,
    columns: Option<&[String]>,
    target: Option<i64>,
    config_path: Option<&Path>,
    pretty: bool,
    trace: Option<&Path>,
) -> Result<ExitCode> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report_failure(config_failure(&e)),
    };
    let mut request = match read_request(input, format, columns)? {
        Ok(r) => r,
        Err(response) => return report_failure(response),
    };
    if target.is_some() {
        request = request.with_target(target);
    }

    let oracle = config.statistical_oracle();
    let recorder = RecordingObserver::new();
    let tee = Tee::new(&TracingObserver, &recorder);
    let observer: &dyn AnalysisObserver = if trace.is_some() { &tee } else { &TracingObserver };
    let analyzed = Analyzer::new(Oracles::uniform(&oracle), &config, observer).analyze(&request);

    if let Some(path) = trace {
        write_trace(path, &recorder)?;
    }

    match analyzed {
        Ok(result) => {
            println!("{}", result.to_json(pretty)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report_failure(ErrorResponse::from(&e)),
    }
}

fn write_trace(path: &Path, recorder: &RecordingObserver) -> Result<()> {
    let mut lines = String::new();
    for event in recorder.events() {
        lines.push_str(&serde_json::to_string(&event)?);
        lines.push('\n');
    }
    std::fs::write(path, lines).with_context(|| format!("failed to write trace to {}", path.display()))
}

fn run_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    config_path: Option<&Path>,
    threads: Option<usize>,
    pretty: bool,
) -> Result<ExitCode> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report_failure(config_failure(&e)),
    };
    if let Some(n) = threads {
        if n == 0 {
            bail!("--threads must be at least 1");
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("failed to configure the worker pool")?;
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let oracle = config.statistical_oracle();
    let analyzer = Analyzer::new(Oracles::uniform(&oracle), &config, &TracingObserver);
    let entries = run_files(&analyzer, inputs, output_dir, pretty);

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    tracing::info!(total = entries.len(), failed, "batch finished");
    println!("{}", serde_json::to_string_pretty(&entries)?);

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_generate(scenario: Scenario, length: usize, seed: u64) -> Result<ExitCode> {
    if length < 2 {
        bail!("--length must be at least 2");
    }
    let request = AnalysisRequest::new(scenario.generate(length, seed), None);
    println!("{}", serde_json::to_string(&request)?);
    Ok(ExitCode::SUCCESS)
}

fn run_config(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    print!("{}", config.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
