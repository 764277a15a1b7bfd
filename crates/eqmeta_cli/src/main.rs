//! eqmeta CLI: inspect the equality artifacts derived from a declarations file.
//!
//! Provides `eqmeta show` to print artifacts, `eqmeta deps` to print the
//! dependency edges they were computed from, and `eqmeta check` to report
//! declaration problems as diagnostics.

#![warn(missing_docs)]

mod check;
mod deps;
mod pipeline;
mod show;

use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

/// eqmeta: incremental equality-artifact engine.
#[derive(Parser, Debug)]
#[command(name = "eqmeta", version, about = "Equality artifact inspector")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to an `eqmeta.toml` file or the directory containing it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute and print equality artifacts.
    Show(ShowArgs),
    /// Print the dependency edges behind each artifact.
    Deps(DepsArgs),
    /// Check declarations and report diagnostics.
    Check(CheckArgs),
}

/// Arguments for the `eqmeta show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// TOML declarations file.
    pub decls: String,

    /// Only show the artifact of this qualified type name.
    #[arg(short, long = "type")]
    pub type_name: Option<String>,

    /// List rejected fields and the reason for each.
    #[arg(long)]
    pub explain: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `eqmeta deps` subcommand.
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// TOML declarations file.
    pub decls: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `eqmeta check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// TOML declarations file.
    pub decls: String,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("TERM").is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = pipeline::load_config(&global).and_then(|config| {
        init_logging(&global, &config.log.level);
        match cli.command {
            Command::Show(ref args) => show::run(args, &global, &config),
            Command::Deps(ref args) => deps::run(args, &global, &config),
            Command::Check(ref args) => check::run(args, &global, &config),
        }
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `-q` and `-v` override the `[log] level` from the configuration.
fn init_logging(global: &GlobalArgs, configured: &str) {
    let level = log_level(global, configured);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}

fn log_level(global: &GlobalArgs, configured: &str) -> tracing::Level {
    if global.quiet {
        tracing::Level::ERROR
    } else if global.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::from_str(configured).unwrap_or(tracing::Level::INFO)
    }
}
