use super::Host;
use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::definition::load_query;
use crate::query::{QueryAnalysis, WRAPPER_FUNCTION, analyze};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use core::fmt::Write as _;
use ohno::{IntoAppError, app_err};
use serde::Serialize;
use std::io::Write;

/// Output format for the analyze command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalyzeFormat {
    /// Human-readable text
    Text,

    /// JSON array, one entry per analyzed query
    Json,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Metric definition files whose queries should be analyzed
    #[arg(value_name = "FILES")]
    pub files: Vec<Utf8PathBuf>,

    /// Analyze a query given directly on the command line (can be repeated)
    #[arg(long, short = 'q', value_name = "QUERY")]
    pub query: Vec<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: AnalyzeFormat,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Serialize)]
struct AnalyzedQuery {
    source: String,
    analysis: QueryAnalysis,
}

/// Analyze queries without contacting the metrics backend.
///
/// # Errors
///
/// Returns an error if nothing was given to analyze or a definition file cannot be loaded.
pub fn analyze_queries<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    init_logging(args.log_level);

    if args.files.is_empty() && args.query.is_empty() {
        return Err(app_err!("nothing to analyze; pass definition files or --query"));
    }

    let mut analyzed = Vec::with_capacity(args.files.len() + args.query.len());

    for path in &args.files {
        let query = load_query(path)?;
        if query.is_empty() {
            log::warn!("'{path}' has no metric query, skipping it");
            continue;
        }
        analyzed.push(AnalyzedQuery {
            source: path.to_string(),
            analysis: analyze(&query),
        });
    }

    analyzed.extend(args.query.iter().map(|query| AnalyzedQuery {
        source: "--query".to_string(),
        analysis: analyze(query),
    }));

    let output = match args.format {
        AnalyzeFormat::Text => {
            let mut text = String::new();
            for (index, entry) in analyzed.iter().enumerate() {
                if index > 0 {
                    writeln!(text)?;
                }
                render_analysis(&entry.source, &entry.analysis, &mut text)?;
            }
            text
        }
        AnalyzeFormat::Json => {
            let mut json = serde_json::to_string_pretty(&analyzed).into_app_err("serializing query analysis")?;
            json.push('\n');
            json
        }
    };

    let _ = write!(host.output(), "{output}");
    Ok(())
}

/// Describe one analysis in human-readable form.
fn render_analysis<W: core::fmt::Write>(source: &str, analysis: &QueryAnalysis, writer: &mut W) -> core::fmt::Result {
    writeln!(writer, "{source}")?;
    writeln!(writer, "  query:     {}", analysis.original_query())?;
    writeln!(writer, "  composite: {}", if analysis.is_composite() { "yes" } else { "no" })?;
    writeln!(writer, "  metrics:")?;

    for (index, metric) in analysis.metrics().iter().enumerate() {
        let span = metric.span();
        if metric.has_wrapper() {
            writeln!(
                writer,
                "    #{} {} [{}..{}, {WRAPPER_FUNCTION} x{}]",
                index + 1,
                metric.clean_text(),
                span.start,
                span.end,
                metric.wrapper_depth()
            )?;
        } else {
            writeln!(writer, "    #{} {} [{}..{}]", index + 1, metric.clean_text(), span.start, span.end)?;
        }
    }

    Ok(())
}
