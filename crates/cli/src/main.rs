mod commands;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use admit_eval::{validate::parse_date, AdmitConfig, ValidationContext};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Admissions record toolchain.
#[derive(Parser)]
#[command(name = "admit", version, about = "Admissions record toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Settle a record and report active rules, clears and group changes
    Evaluate {
        /// Path to the record JSON file
        record: PathBuf,
    },

    /// Validate a record and list every issue
    Validate {
        /// Path to the record JSON file
        record: PathBuf,
        /// Date to validate against (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },

    /// Build the submission payload for a valid record
    Payload {
        /// Path to the record JSON file
        record: PathBuf,
        #[arg(long)]
        today: Option<String>,
    },

    /// Resolve region and city for a country and postal code
    Lookup {
        #[arg(long)]
        country: String,
        #[arg(long)]
        postal_code: String,
    },

    /// Validate, encode and post a record to the configured endpoint
    Submit {
        /// Path to the record JSON file
        record: PathBuf,
        #[arg(long)]
        today: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let output = cli.output;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Evaluate { record } => {
            commands::evaluate::cmd_evaluate(&record, output, quiet);
        }
        Commands::Validate { record, today } => {
            let ctx = context(today.as_deref(), output, quiet);
            commands::validate::cmd_validate(&record, &ctx, output, quiet);
        }
        Commands::Payload { record, today } => {
            let ctx = context(today.as_deref(), output, quiet);
            commands::payload::cmd_payload(&record, &ctx, output, quiet);
        }
        Commands::Lookup {
            country,
            postal_code,
        } => {
            let config = load_config(cli.config.as_deref(), output, quiet);
            commands::lookup::cmd_lookup(&config, &country, &postal_code, output, quiet);
        }
        Commands::Submit { record, today } => {
            let config = load_config(cli.config.as_deref(), output, quiet);
            let ctx = context(today.as_deref(), output, quiet);
            commands::submit::cmd_submit(&config, &record, &ctx, output, quiet);
        }
    }
}

/// Logs go to stderr so stdout stays machine readable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn context(today: Option<&str>, output: OutputFormat, quiet: bool) -> ValidationContext {
    match today {
        None => ValidationContext::now(),
        Some(s) => match parse_date(s) {
            Some(date) => ValidationContext::new(date),
            None => {
                report_error(
                    &format!("error: invalid --today '{}', expected YYYY-MM-DD", s),
                    output,
                    quiet,
                );
                process::exit(1);
            }
        },
    }
}

fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> AdmitConfig {
    match AdmitConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Read a JSON file, exiting with a report on failure.
pub(crate) fn read_json(path: &Path, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn print_json(value: &impl serde::Serialize) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
