use serde::Deserialize;

/// What the metrics backend said about a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The query ran and the latest non-null point had this value.
    Data(f64),

    /// The query ran but produced no series or only null points.
    NoData,

    /// The backend refused the query (bad syntax, unknown function, bad credentials, ...).
    Rejected(String),
}

impl QueryOutcome {
    /// Classify a successful (2xx) response body.
    pub(super) fn from_body(body: &QueryResponse) -> Self {
        if body.status.as_deref() == Some("error") {
            let message = body.error.clone().unwrap_or_else(|| "unspecified query error".to_string());
            return Self::Rejected(message);
        }

        let Some(series) = body.series.first() else {
            return Self::NoData;
        };

        // A series without an end timestamp never received points.
        if series.end.is_none() {
            return Self::NoData;
        }

        series
            .pointlist
            .iter()
            .rev()
            .find_map(|point| point.get(1).copied().flatten())
            .map_or(Self::NoData, Self::Data)
    }

    /// Classify a 4xx response body.
    pub(super) fn from_client_error(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .filter(|e| !e.errors.is_empty())
            .map_or_else(
                || {
                    let body = body.trim();
                    if body.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        format!("HTTP {status}: {body}")
                    }
                },
                |e| e.errors.join("; "),
            );

        Self::Rejected(message)
    }
}

/// Body of `GET /api/v1/query`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct QueryResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Debug, Default, Deserialize)]
struct Series {
    /// `[timestamp, value]` pairs; either element may be null.
    #[serde(default)]
    pointlist: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    end: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}
