use crate::Result;
use camino::Utf8Path;
use ohno::IntoAppError;
use serde::Deserialize;
use std::fs;

/// The parts of a `DatadogMetric` manifest the linter reads.
#[derive(Debug, Default, Deserialize)]
pub struct MetricDefinition {
    #[serde(default)]
    spec: Option<MetricSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct MetricSpec {
    #[serde(default)]
    query: Option<String>,
}

impl MetricDefinition {
    /// Parse a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not YAML or does not describe a mapping.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// The metric query, or an empty string when the manifest has none.
    #[must_use]
    pub fn query(&self) -> &str {
        self.spec.as_ref().and_then(|spec| spec.query.as_deref()).unwrap_or_default()
    }
}

/// Read a manifest and return its `spec.query`.
///
/// A manifest without a query is not an error; the query comes back empty.
pub fn load_query(path: &Utf8Path) -> Result<String> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading metric definition '{path}'"))?;
    let definition = MetricDefinition::from_yaml(&text).into_app_err_with(|| format!("parsing metric definition '{path}'"))?;

    Ok(definition.query().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_reads_spec_query() {
        let yaml = r"
apiVersion: datadoghq.com/v1alpha1
kind: DatadogMetric
metadata:
  name: queue-time
spec:
  query: default_zero(avg:system.cpu.user{*})
";
        let definition = MetricDefinition::from_yaml(yaml).unwrap();
        assert_eq!(definition.query(), "default_zero(avg:system.cpu.user{*})");
    }

    #[test]
    fn test_missing_spec_yields_empty_query() {
        let definition = MetricDefinition::from_yaml("kind: DatadogMetric\n").unwrap();
        assert_eq!(definition.query(), "");
    }

    #[test]
    fn test_missing_query_yields_empty_query() {
        let definition = MetricDefinition::from_yaml("spec:\n  externalMetricName: foo\n").unwrap();
        assert_eq!(definition.query(), "");
    }

    #[test]
    fn test_null_query_yields_empty_query() {
        let definition = MetricDefinition::from_yaml("spec:\n  query:\n").unwrap();
        assert_eq!(definition.query(), "");
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        assert!(MetricDefinition::from_yaml("Hello, world").is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_query_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("metric.yaml")).unwrap();
        fs::write(&path, "spec:\n  query: \"avg:a{*} + avg:b{*}\"\n").unwrap();

        assert_eq!(load_query(&path).unwrap(), "avg:a{*} + avg:b{*}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_query_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("missing.yaml")).unwrap();

        let err = load_query(&path).unwrap_err();
        assert!(err.to_string().contains("reading metric definition"), "{err}");
    }
}
