use camino::{Utf8Path, Utf8PathBuf};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, e.g. the value a valid query returned.
    Info,

    /// Suspicious but not fatal, e.g. a metric with no recent data.
    Warning,

    /// The definition is broken and counts towards the exit code.
    Failure,
}

/// A single observation about a metric definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,

    /// Position of the metric within the query, for findings about one metric of a
    /// composite query.
    pub metric_index: Option<usize>,

    /// The query text the finding is about.
    pub query: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            metric_index: None,
            query: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub const fn with_metric_index(mut self, index: usize) -> Self {
        self.metric_index = Some(index);
        self
    }
}

/// Everything found while validating one metric definition file.
#[derive(Debug, Clone)]
pub struct FileReport {
    path: Utf8PathBuf,
    findings: Vec<Finding>,
}

impl FileReport {
    #[must_use]
    pub fn new(path: &Utf8Path) -> Self {
        Self {
            path: path.to_path_buf(),
            findings: Vec::new(),
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Findings in the order they were produced.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Number of failure findings.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.count(Severity::Failure)
    }

    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}
