//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::OutputFormat;
use crate::adapters::csv_adapter::{ColumnNames, CsvAdapter, read_election};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::affiliation::{AffiliationMap, DEFAULT_RED_PARTY, classify};
use crate::domain::config_validation::{validate_config, validate_data_paths};
use crate::domain::deviation::{DeviationOptions, DeviationReport, MissingYearPolicy, diff_ratios};
use crate::domain::error::RedblueError;
use crate::ports::config_port::{ConfigPort, parse_bool};
use crate::ports::dataset_port::DatasetPort;

#[derive(Parser, Debug)]
#[command(
    name = "redblue",
    about = "Intake/outflow ratios of red and blue states versus the nationwide ratio"
)]
pub struct Cli {
    /// Increase diagnostic output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Election results CSV (overrides [data] election_path)
    #[arg(long)]
    pub election: Option<PathBuf>,
    /// Financial CSV (overrides [data] financial_path)
    #[arg(long)]
    pub financial: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute per-year deviations of red and blue states from the nationwide ratio
    Run {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Omit years lacking election or segment data instead of failing
        #[arg(long)]
        best_effort: bool,
        /// Fail when a state is listed under both colors in one year
        #[arg(long)]
        reject_overlap: bool,
    },
    /// Print the red/blue classification for each election year
    Classify {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a `run` needs, resolved from flags, config and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub election_path: PathBuf,
    pub financial_path: PathBuf,
    pub columns: ColumnNames,
    pub options: DeviationOptions,
    pub format: OutputFormat,
}

/// Install the stderr `tracing` subscriber. Safe to call more than once.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            data,
            format,
            best_effort,
            reject_overlap,
        } => run_deviation(&data, format, best_effort, reject_overlap),
        Command::Classify { data } => run_classify(&data),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RedblueError> {
    FileConfigAdapter::from_file(path).map_err(|e| RedblueError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, RedblueError> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            let config = load_config(p)?;
            validate_config(&config)?;
            Ok(config)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn fail(err: RedblueError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_deviation(
    data: &DataArgs,
    format: Option<OutputFormat>,
    best_effort: bool,
    reject_overlap: bool,
) -> ExitCode {
    // Stage 1: resolve settings
    let settings = match resolve_run_settings(data, format, best_effort, reject_overlap) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    debug!(?settings, "resolved settings");

    let adapter = CsvAdapter::new(
        settings.election_path.clone(),
        settings.financial_path.clone(),
        settings.columns.clone(),
    );

    // Stage 2-4: load, compute, render
    match run_pipeline(&adapter, &settings.options) {
        Ok(report) => {
            print_summary(&report);
            let reporter = settings.format.reporter();
            match reporter.write_to(&report, &mut io::stdout().lock()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => fail(e),
            }
        }
        Err(e) => fail(e),
    }
}

/// Load both datasets and compute the deviation report.
pub fn run_pipeline<D: DatasetPort + Sync>(
    data_port: &D,
    options: &DeviationOptions,
) -> Result<DeviationReport, RedblueError> {
    let (election, financial) = data_port.load_both()?;
    eprintln!(
        "Loaded {} election rows and {} financial rows",
        election.len(),
        financial.len()
    );

    info!(
        red_party = %options.red_party,
        missing_year = ?options.missing_year,
        reject_overlap = options.reject_overlap,
        "computing deviations"
    );
    diff_ratios(&financial, &election, options)
}

fn print_summary(report: &DeviationReport) {
    eprintln!(
        "Computed deviations for {} years ({} rows excluded, {} years omitted, {} overlaps)",
        report.years.len(),
        report.excluded,
        report.skipped_years.len(),
        report.overlaps.len(),
    );
}

/// Settings for `run`: config over defaults, then command-line flags on top.
pub fn resolve_run_settings(
    data: &DataArgs,
    format: Option<OutputFormat>,
    best_effort: bool,
    reject_overlap: bool,
) -> Result<RunSettings, RedblueError> {
    let config = load_optional_config(data.config.as_ref())?;
    let mut settings = build_run_settings(data, &config)?;
    if let Some(f) = format {
        settings.format = f;
    }
    if best_effort {
        settings.options.missing_year = MissingYearPolicy::Skip;
    }
    if reject_overlap {
        settings.options.reject_overlap = true;
    }
    Ok(settings)
}

pub fn build_run_settings(
    data: &DataArgs,
    config: &dyn ConfigPort,
) -> Result<RunSettings, RedblueError> {
    let format = match config.get_string("output", "format") {
        Some(f) => f.parse::<OutputFormat>().map_err(|reason| RedblueError::ConfigInvalid {
            section: "output".into(),
            key: "format".into(),
            reason,
        })?,
        None => OutputFormat::default(),
    };

    Ok(RunSettings {
        election_path: resolve_path(data.election.as_ref(), config, "election_path")?,
        financial_path: resolve_path(data.financial.as_ref(), config, "financial_path")?,
        columns: build_columns(config),
        options: build_options(config)?,
        format,
    })
}

/// Flag value, else `[data] <key>`, else `ConfigMissing`.
pub fn resolve_path(
    flag: Option<&PathBuf>,
    config: &dyn ConfigPort,
    key: &str,
) -> Result<PathBuf, RedblueError> {
    if let Some(p) = flag {
        return Ok(p.clone());
    }
    config
        .get_string("data", key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| RedblueError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })
}

pub fn build_columns(config: &dyn ConfigPort) -> ColumnNames {
    let defaults = ColumnNames::default();
    let get = |key: &str, default: String| {
        config
            .get_string("columns", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
    };
    ColumnNames {
        state: get("state", defaults.state),
        year: get("year", defaults.year),
        party: get("party", defaults.party),
        intake: get("intake", defaults.intake),
        outflow: get("outflow", defaults.outflow),
    }
}

pub fn build_options(config: &dyn ConfigPort) -> Result<DeviationOptions, RedblueError> {
    let missing_year = match config.get_string("analysis", "missing_year") {
        Some(s) => s.parse::<MissingYearPolicy>().map_err(|reason| RedblueError::ConfigInvalid {
            section: "analysis".into(),
            key: "missing_year".into(),
            reason,
        })?,
        None => MissingYearPolicy::default(),
    };

    let reject_overlap = match config.get_string("analysis", "reject_overlap") {
        Some(s) => parse_bool(&s).ok_or_else(|| RedblueError::ConfigInvalid {
            section: "analysis".into(),
            key: "reject_overlap".into(),
            reason: format!("expected true or false, got {s:?}"),
        })?,
        None => false,
    };

    Ok(DeviationOptions {
        red_party: config
            .get_string("analysis", "red_party")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_RED_PARTY.to_string()),
        missing_year,
        reject_overlap,
    })
}

fn run_classify(data: &DataArgs) -> ExitCode {
    let result = load_optional_config(data.config.as_ref()).and_then(|config| {
        let path = resolve_path(data.election.as_ref(), &config, "election_path")?;
        let columns = build_columns(&config);
        let options = build_options(&config)?;
        let records = read_election(&path, &columns)?;
        eprintln!("Loaded {} election rows from {}", records.len(), path.display());
        Ok(classify(&records, &options.red_party))
    });

    match result {
        Ok(map) => {
            print!("{}", format_affiliation(&map));
            for overlap in map.overlaps() {
                eprintln!(
                    "Warning: {} is both red and blue in {}",
                    overlap.state, overlap.year
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// One line per year and color: `2000 red: TX, UT`.
pub fn format_affiliation(map: &AffiliationMap) -> String {
    let mut out = String::new();
    for (year, aff) in map.iter() {
        for (label, states) in [("red", &aff.red), ("blue", &aff.blue)] {
            let names: Vec<&str> = states.iter().map(String::as_str).collect();
            out.push_str(&format!("{year} {label}: {}\n", names.join(", ")));
        }
    }
    out
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    if let Err(e) = validate_config(&config).and_then(|_| validate_data_paths(&config)) {
        return fail(e);
    }

    let columns = build_columns(&config);
    let options = match build_options(&config) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    eprintln!("\nColumns:");
    eprintln!("  state:   {}", columns.state);
    eprintln!("  year:    {}", columns.year);
    eprintln!("  party:   {}", columns.party);
    eprintln!("  intake:  {}", columns.intake);
    eprintln!("  outflow: {}", columns.outflow);
    eprintln!("\nAnalysis:");
    eprintln!("  red_party:      {}", options.red_party);
    eprintln!("  missing_year:   {:?}", options.missing_year);
    eprintln!("  reject_overlap: {}", options.reject_overlap);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
