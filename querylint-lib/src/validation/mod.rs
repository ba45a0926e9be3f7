//! Validating metric definitions against the backend
//!
//! The [`Validator`] loads each definition, analyzes its query, and runs the query and
//! its constituent metrics against the metrics backend. Everything it learns is recorded
//! as [`Finding`]s in a per-file [`FileReport`].

mod file_report;
mod validator;

pub use file_report::{FileReport, Finding, Severity};
pub use validator::Validator;
