//! Command dispatch logic for querylint

use super::{AnalyzeArgs, InitArgs, LintArgs, ValidateArgs, analyze_queries, init_config, lint_files, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "querylint", author, version, long_about = None)]
#[command(about = "Lint Datadog metric queries in metric definition files")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: QuerylintSubcommand,
}

#[derive(Subcommand, Debug)]
enum QuerylintSubcommand {
    /// Validate metric definitions against the Datadog metrics API
    Lint(Box<LintArgs>),
    /// Show how queries break down into metrics, without contacting Datadog
    Analyze(AnalyzeArgs),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    match &cli.command {
        QuerylintSubcommand::Lint(lint_args) => lint_files(host, lint_args).await,
        QuerylintSubcommand::Analyze(analyze_args) => analyze_queries(host, analyze_args),
        QuerylintSubcommand::Init(init_args) => init_config(host, init_args),
        QuerylintSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}
