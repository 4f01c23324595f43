//! @ai:module:intent CLI entry point for generating SLO specifications
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on config, source, aggregator, output, logging

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use slocomments::{
    aggregate, logging, output, Aggregation, Config, OutputFormat, ReportFormat, ServicePolicy,
    SourceAdapter,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "slocomments")]
#[command(author, version, about = "Generate Sloth SLO specifications from source code comments")]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the specification from source comments
    Generate {
        /// Directory to write the specification files to (defaults to the current directory)
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        /// Output formats
        #[arg(long, short, value_enum)]
        format: Vec<Format>,

        /// Print the specification to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Report malformed directives without writing anything
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Report format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Report,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Directories to scan for directives
    #[arg(long = "include", short = 'i')]
    include: Vec<PathBuf>,

    /// Source languages to scan (go, rust, python, ...)
    #[arg(long = "lang", short = 'l')]
    languages: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Keep the first service declaration and report differing ones
    #[arg(long)]
    reject_conflicts: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Report {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Yaml => OutputFormat::Yaml,
            Format::Json => OutputFormat::Json,
        }
    }
}

impl From<Report> for ReportFormat {
    fn from(r: Report) -> Self {
        match r {
            Report::Text => ReportFormat::Text,
            Report::Json => ReportFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, cli.log_json);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Generate {
            output_dir,
            source,
            format,
            stdout,
        } => {
            let mut config = load_config(&source)?;
            if !format.is_empty() {
                config.formats = format.into_iter().map(OutputFormat::from).collect();
            }
            config.stdout |= stdout;
            if output_dir.is_some() {
                config.output_dir = output_dir;
            }

            let aggregation = collect(&config)?;
            let output_dir = match (&config.output_dir, config.stdout) {
                (Some(dir), _) => Some(dir.clone()),
                (None, true) => None,
                (None, false) => Some(std::env::current_dir().context("Failed to resolve current directory")?),
            };

            output::write_specification(
                &aggregation.spec,
                &config.formats,
                config.stdout,
                output_dir.as_deref(),
            )
            .context("Failed to write specification")?;

            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { source, format } => {
            let config = load_config(&source)?;
            let aggregation = collect(&config)?;
            print!("{}", output::format_report(&aggregation, format.into()));

            if aggregation.has_failures() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// @ai:intent Merge the configuration file with command line overrides
/// @ai:effects fs:read
fn load_config(args: &SourceArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    if !args.include.is_empty() {
        config.include = args.include.clone();
    }
    if !args.languages.is_empty() {
        config.languages = args.languages.clone();
    }
    if args.reject_conflicts {
        config.service_policy = ServicePolicy::RejectConflicts;
    }

    Ok(config)
}

/// @ai:intent Walk the configured roots and fold their directives
/// @ai:effects fs:read
fn collect(config: &Config) -> Result<Aggregation> {
    let adapter = config.adapter()?;
    tracing::info!(
        roots = ?config.include,
        languages = ?adapter.languages(),
        "Collecting directives"
    );

    let files = adapter
        .collect(&config.include)
        .context("Failed to collect source files")?;

    let aggregation = aggregate(&files, &config.aggregate_options());
    if aggregation.spec.is_empty() {
        tracing::warn!(roots = ?config.include, "No @sloth directives found");
    }
    Ok(aggregation)
}
