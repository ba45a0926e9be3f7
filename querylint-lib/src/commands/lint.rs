use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::backend::MetricsClient;
use crate::validation::{FileReport, Severity, Validator};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use core::fmt::Write as _;
use ohno::app_err;
use owo_colors::OwoColorize;
use std::io::Write;

/// Exit codes above this wrap around on most platforms.
const MAX_EXIT_CODE: usize = 255;

#[derive(Parser, Debug)]
pub struct LintArgs {
    /// Metric definition files to validate
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<Utf8PathBuf>,

    /// Path to configuration file (default is `querylint.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Datadog API key
    #[arg(long, value_name = "KEY", env = "DD_CLIENT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Datadog application key
    #[arg(long, value_name = "KEY", env = "DD_CLIENT_APP_KEY", hide_env_values = true)]
    pub app_key: Option<String>,

    /// Root URL of the metrics API, overriding the configuration file
    #[arg(long, value_name = "URL")]
    pub site: Option<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

/// Validate metric definition files and exit with the number of failures.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, credentials are missing, or
/// the metrics client cannot be created. Problems with individual files are reported as
/// findings, not errors.
pub async fn lint_files<H: Host>(host: &mut H, args: &LintArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let mut options = config.client_options();
    if let Some(site) = &args.site {
        options.site.clone_from(site);
    }

    let api_key = args
        .api_key
        .as_deref()
        .ok_or_else(|| app_err!("no Datadog API key provided; use --api-key or set DD_CLIENT_API_KEY"))?;
    let app_key = args
        .app_key
        .as_deref()
        .ok_or_else(|| app_err!("no Datadog application key provided; use --app-key or set DD_CLIENT_APP_KEY"))?;

    let validator = Validator::new(MetricsClient::new(api_key, app_key, &options)?);

    log::info!("validating {} metric definition(s) against {}", args.files.len(), options.site);
    let reports = validator.validate_files(&args.files).await;

    let mut output = String::new();
    render_reports(&reports, args.color.use_colors(), &mut output)?;
    let _ = write!(host.output(), "{output}");

    let failures: usize = reports.iter().map(FileReport::failures).sum();
    if failures > 0 {
        host.exit(exit_code(failures));
    }

    Ok(())
}

/// Map a failure count to a process exit code that stays non-zero.
fn exit_code(failures: usize) -> i32 {
    i32::try_from(failures.min(MAX_EXIT_CODE)).unwrap_or(i32::MAX)
}

/// Render lint results followed by a one-line summary.
pub fn render_reports<W: core::fmt::Write>(reports: &[FileReport], use_colors: bool, writer: &mut W) -> core::fmt::Result {
    for report in reports {
        if use_colors {
            writeln!(writer, "{}", report.path().bold())?;
        } else {
            writeln!(writer, "{}", report.path())?;
        }

        for finding in report.findings() {
            let label = match finding.severity {
                Severity::Failure => "FAIL",
                Severity::Warning => "WARN",
                Severity::Info => "INFO",
            };
            let label = if use_colors {
                match finding.severity {
                    Severity::Failure => label.red().bold().to_string(),
                    Severity::Warning => label.yellow().bold().to_string(),
                    Severity::Info => label.blue().to_string(),
                }
            } else {
                label.to_string()
            };

            match finding.metric_index {
                Some(index) => writeln!(writer, "  {label} metric #{}: {}", index + 1, finding.message)?,
                None => writeln!(writer, "  {label} {}", finding.message)?,
            }

            if let Some(query) = &finding.query {
                if use_colors {
                    writeln!(writer, "       {}", query.dimmed())?;
                } else {
                    writeln!(writer, "       {query}")?;
                }
            }
        }

        writeln!(writer)?;
    }

    let failures: usize = reports.iter().map(FileReport::failures).sum();
    let warnings: usize = reports.iter().map(FileReport::warnings).sum();
    let mut summary = String::new();
    write!(
        summary,
        "{} checked: {}, {}",
        plural(reports.len(), "file"),
        plural(failures, "failure"),
        plural(warnings, "warning")
    )?;

    if use_colors && failures > 0 {
        writeln!(writer, "{}", summary.red().bold())
    } else if use_colors {
        writeln!(writer, "{}", summary.green().bold())
    } else {
        writeln!(writer, "{summary}")
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 { format!("1 {noun}") } else { format!("{count} {noun}s") }
}
