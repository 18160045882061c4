//! Error types for the aggregation engine.

use std::path::PathBuf;
use std::time::Duration;

use crate::fragment::FragmentKind;
use crate::model::{Arch, Variant};

/// Every way a single aggregation run can fail.
///
/// Any of these aborts the whole run: there is no partial record.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Network, auth or non-success status from a Jenkins endpoint.
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// An artifact could not be read from the build workspace.
    #[error("failed to read {path:?}: {message}")]
    Read { path: PathBuf, message: String },

    /// A Jenkins API response was not the JSON shape we expect.
    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    /// No matrix run URL carried a recognisable platform label.
    #[error("no platform label found in matrix runs for build {build}")]
    LabelParse { build: u64 },

    /// The matrix job has no run for the requested major/variant/arch.
    #[error("no matrix run for RHEL{major}-{variant}-{arch}")]
    DistroNotFound {
        major: u32,
        variant: Variant,
        arch: Arch,
    },

    /// The build metadata carried no action with a cause.
    #[error("no triggering cause recorded for build")]
    NoTriggerFound,

    #[error("malformed CI message: {message}")]
    MalformedMessage { message: String },

    #[error("malformed test report: {message}")]
    MalformedReport { message: String },

    /// Every source finished but some fragment kinds never arrived.
    #[error("aggregation ended without {missing:?}")]
    Incomplete { missing: Vec<FragmentKind> },

    /// The whole run did not finish within the configured bound.
    #[error("aggregation timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl MetricsError {
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(what: &'static str, err: impl ToString) -> Self {
        Self::Parse {
            what,
            message: err.to_string(),
        }
    }
}

/// Result type for metricizer operations.
pub type MetricsResult<T> = Result<T, MetricsError>;
