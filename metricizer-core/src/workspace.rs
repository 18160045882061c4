//! Reads build artifacts straight out of a Jenkins workspace on disk.
//!
//! A matrix build lays each configuration out under the job directory with
//! the axis assignments turned into path segments, so the configuration
//! `PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm` of job `J` keeps
//! its test output in `J/PLATFORM/RedHatEnterpriseLinux7-Server-x86_64/label/rhsm/test-output`.
//! The CI message sits at the workspace root.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MetricsError, MetricsResult};

/// `{root}/{job with axes as directories}/test-output/{artifact}` for a
/// configuration job such as `J/PLATFORM=...,label=rhsm`.
pub fn test_output_path(root: &Path, configuration_job: &str, artifact: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(configuration_job.split(['/', ',', '=']).filter(|s| !s.is_empty()));
    path.push("test-output");
    path.push(artifact);
    path
}

/// `{root}/{artifact}`.
pub fn root_artifact_path(root: &Path, artifact: &str) -> PathBuf {
    root.join(artifact)
}

pub async fn read_artifact(path: &Path) -> MetricsResult<Vec<u8>> {
    debug!(path = %path.display(), "[COLLECT] Reading workspace artifact");
    tokio::fs::read(path).await.map_err(|e| MetricsError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
