//! The single URL template every Jenkins request goes through.

use crate::model::JobLocator;

/// Build actions, including the recorded causes.
pub const ACTIONS_API: &str = "/api/json?pretty=true";
/// Build start timestamp only.
pub const TIMESTAMP_API: &str = "/api/json?tree=timestamp";
/// Variables injected by the EnvInject plugin.
pub const INJECTED_VARS_API: &str = "/injectedEnvVars/export";
/// Matrix configuration runs of a multi-configuration build.
pub const MATRIX_RUNS_API: &str = "/api/json?tree=runs[number,url]";

/// Suffix addressing an archived file under `test-output/`.
pub fn artifact_suffix(artifact_name: &str) -> String {
    format!("/artifact/test-output/{artifact_name}")
}

/// `{base}/view/{tab}/job/{job}/{build}{suffix}`; the tab segment is dropped
/// entirely when the locator has no view.
pub fn make_url(locator: &JobLocator, suffix: &str) -> String {
    let base = locator.jenkins_url.trim_end_matches('/');
    if locator.tab.is_empty() {
        format!(
            "{}/view/job/{}/{}{}",
            base, locator.job, locator.build, suffix
        )
    } else {
        format!(
            "{}/view/{}/job/{}/{}{}",
            base, locator.tab, locator.job, locator.build, suffix
        )
    }
}
