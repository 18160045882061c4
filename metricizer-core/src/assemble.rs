//! Builds the final CI metrics record from a completed accumulator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{MetricsError, MetricsResult};
use crate::fragment::Accumulator;
use crate::job_time::iso8601_millis;
use crate::model::{Arch, Distro};
use crate::trigger::Trigger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Executor {
    #[default]
    #[serde(rename = "beaker")]
    Beaker,
    #[serde(rename = "CI-OSP")]
    CiOsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Official,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsTest {
    pub executor: Executor,
    pub arch: Arch,
    pub executed: u64,
    pub failed: u64,
    pub passed: u64,
}

/// The CI metrics document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub component: String,
    pub trigger: String,
    pub tests: Vec<MetricsTest>,
    pub jenkins_job_url: String,
    pub jenkins_build_url: String,
    pub logstash_url: String,
    #[serde(rename = "CI_tier")]
    pub ci_tier: u32,
    pub base_distro: String,
    pub brew_task_id: String,
    pub compose_id: String,
    pub create_time: String,
    pub completion_time: String,
    #[serde(rename = "CI_infra_failure")]
    pub ci_infra_failure: String,
    #[serde(rename = "CI_infra_failure_desc")]
    pub ci_infra_failure_desc: String,
    pub job_name: String,
    pub build_type: BuildType,
    pub team: String,
    pub recipients: Vec<String>,
    pub artifact: String,
}

/// Fields that do not come out of Jenkins for this build.
///
/// The job/build URLs and job name fall back to the build's injected
/// `JOB_URL`, `BUILD_URL` and `JOB_NAME` when left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticMetadata {
    pub team: String,
    pub recipients: Vec<String>,
    pub executor: Executor,
    pub job_url: Option<String>,
    pub build_url: Option<String>,
    pub job_name: Option<String>,
    pub logstash_url: String,
    pub compose_id: String,
    pub artifact: String,
    pub ci_infra_failure: String,
    pub ci_infra_failure_desc: String,
}

/// `Tier<digit>` in the job name, 0 when absent.
pub fn tier_from_job_name(job_name: &str) -> u32 {
    static TIER: OnceLock<Regex> = OnceLock::new();
    TIER.get_or_init(|| Regex::new(r"Tier(\d)").expect("tier pattern is valid"))
        .captures(job_name)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

fn configured_or_injected(configured: &Option<String>, acc: &Accumulator, var: &str) -> String {
    configured
        .clone()
        .or_else(|| acc.env_vars.get(var).cloned())
        .unwrap_or_default()
}

/// Fails when the test time or the completion instant it yields cannot be rendered.
pub fn assemble(
    acc: Accumulator,
    distro: &Distro,
    tier: u32,
    meta: &StaticMetadata,
) -> MetricsResult<MetricsRecord> {
    let tally = &acc.test_results.tally;
    let tests = vec![MetricsTest {
        executor: meta.executor,
        arch: distro.arch,
        executed: tally.total,
        failed: tally.failures.saturating_add(tally.errors),
        passed: tally.passed,
    }];

    if !tally.time.is_finite() || tally.time < 0.0 {
        return Err(MetricsError::MalformedReport {
            message: format!("elapsed time out of range: {}", tally.time),
        });
    }
    let elapsed_ms = (tally.time * 1000.0).round() as i64;
    let completion_time = iso8601_millis(acc.epoch.saturating_add(elapsed_ms))?;

    let build_type = match acc.trigger {
        Some(Trigger::Brew) => BuildType::Official,
        _ => BuildType::Internal,
    };

    Ok(MetricsRecord {
        component: acc.components.first().cloned().unwrap_or_default(),
        trigger: acc.trigger.map(|t| t.as_str().to_owned()).unwrap_or_default(),
        tests,
        jenkins_job_url: configured_or_injected(&meta.job_url, &acc, "JOB_URL"),
        jenkins_build_url: configured_or_injected(&meta.build_url, &acc, "BUILD_URL"),
        logstash_url: meta.logstash_url.clone(),
        ci_tier: tier,
        base_distro: distro.base_distro(),
        brew_task_id: acc.brew_task_id.clone(),
        compose_id: meta.compose_id.clone(),
        create_time: acc.create_time.clone(),
        completion_time,
        ci_infra_failure: meta.ci_infra_failure.clone(),
        ci_infra_failure_desc: meta.ci_infra_failure_desc.clone(),
        job_name: configured_or_injected(&meta.job_name, &acc, "JOB_NAME"),
        build_type,
        team: meta.team.clone(),
        recipients: meta.recipients.clone(),
        artifact: meta.artifact.clone(),
    })
}
