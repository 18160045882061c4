//! High-level pipeline: fans out every Jenkins source for one build, merges the
//! fragments, and assembles the metrics record.
//!
//! # Sources
//! - build actions -> trigger
//! - build timestamp -> ci-time
//! - injected variables -> env-vars
//! - matrix runs -> platform labels, which then gate
//!   - the test report artifact -> test-results
//!   - the CI message artifact -> ci-message
//!
//! The first three and the label lookup start together. As soon as the labels
//! resolve, the two artifact pipelines join the same in-flight set.
//!
//! # Error Handling
//! Fail-fast: the first source error aborts the run and drops everything
//! still in flight. The assembler only ever sees a complete accumulator.
//! With a workspace configured, the two artifacts are read from disk instead
//! of the artifact store; label resolution still gates them.
//!
//! Two local policies apply:
//! - a build with no recorded cause counts as a manual trigger;
//! - a CI message that cannot be fetched or decoded is replaced, once, by
//!   the configured fallback message.
//!
//! # Navigation
//! - Main entrypoints: [`aggregate`], [`collect_metrics`]
//! - Run options: [`CollectOptions`]

use futures::future::{BoxFuture, FutureExt, TryFutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::aggregate::Aggregator;
use crate::assemble::{assemble, tier_from_job_name, MetricsRecord, StaticMetadata};
use crate::contract::Fetcher;
use crate::env_vars::decode_env_vars;
use crate::error::{MetricsError, MetricsResult};
use crate::fragment::{Accumulator, Fragment};
use crate::job_time::decode_job_time;
use crate::labels::{configuration_segment, decode_matrix_runs};
use crate::message::{decode_ci_message, DEFAULT_CI_MESSAGE};
use crate::model::{Distro, JobLocator};
use crate::report::tally_report;
use crate::trigger::{classify_trigger, Trigger};
use crate::url::{
    artifact_suffix, make_url, ACTIONS_API, INJECTED_VARS_API, MATRIX_RUNS_API, TIMESTAMP_API,
};
use crate::workspace::{read_artifact, root_artifact_path, test_output_path};

pub const DEFAULT_TEST_REPORT: &str = "testng-polarion.xml";
pub const DEFAULT_CI_MESSAGE_ARTIFACT: &str = "CI_MESSAGE.json";

/// Per-run knobs.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Artifact name of the XML test report under `test-output/`.
    pub test_report_artifact: String,
    /// Artifact name of the CI message under `test-output/`.
    pub ci_message_artifact: String,
    /// Substituted once when the CI message artifact is unusable.
    pub fallback_message: Option<Vec<u8>>,
    /// Upper bound on the whole run.
    pub timeout: Option<Duration>,
    /// Build workspace to read both artifacts from instead of Jenkins.
    pub workspace: Option<PathBuf>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            test_report_artifact: DEFAULT_TEST_REPORT.to_string(),
            ci_message_artifact: DEFAULT_CI_MESSAGE_ARTIFACT.to_string(),
            fallback_message: Some(DEFAULT_CI_MESSAGE.as_bytes().to_vec()),
            timeout: None,
            workspace: None,
        }
    }
}

enum Step {
    Fragment(Fragment),
    /// Locator of the matrix configuration matching the distro.
    Configuration(JobLocator),
}

async fn fetch<F>(fetcher: &F, locator: &JobLocator, suffix: &str) -> MetricsResult<Vec<u8>>
where
    F: Fetcher + ?Sized,
{
    let url = make_url(locator, suffix);
    debug!(url = %url, "[COLLECT] Fetching");
    let body = fetcher.fetch(&url, &locator.credentials).await?;
    debug!(url = %url, bytes = body.len(), "[COLLECT] Fetched");
    Ok(body)
}

async fn trigger_source<F>(fetcher: &F, locator: &JobLocator) -> MetricsResult<Fragment>
where
    F: Fetcher + ?Sized,
{
    let body = fetch(fetcher, locator, ACTIONS_API).await?;
    let trigger = match classify_trigger(&body) {
        Ok(t) => t,
        Err(MetricsError::NoTriggerFound) => {
            warn!(job = %locator.job, build = locator.build, "[COLLECT] No triggering cause recorded, counting as manual");
            Trigger::Manual
        }
        Err(e) => return Err(e),
    };
    Ok(Fragment::Trigger(trigger))
}

async fn job_time_source<F>(fetcher: &F, locator: &JobLocator) -> MetricsResult<Fragment>
where
    F: Fetcher + ?Sized,
{
    let body = fetch(fetcher, locator, TIMESTAMP_API).await?;
    Ok(Fragment::CiTime(decode_job_time(&body)?))
}

async fn env_vars_source<F>(fetcher: &F, locator: &JobLocator) -> MetricsResult<Fragment>
where
    F: Fetcher + ?Sized,
{
    let body = fetch(fetcher, locator, INJECTED_VARS_API).await?;
    Ok(Fragment::EnvVars(decode_env_vars(&body)?))
}

async fn configuration_source<F>(
    fetcher: &F,
    locator: &JobLocator,
    distro: &Distro,
) -> MetricsResult<JobLocator>
where
    F: Fetcher + ?Sized,
{
    let body = fetch(fetcher, locator, MATRIX_RUNS_API).await?;
    let labels = decode_matrix_runs(&body, locator.build)?;
    let run_url = labels.resolve(distro)?;
    let segment = configuration_segment(run_url).ok_or(MetricsError::LabelParse {
        build: locator.build,
    })?;
    info!(configuration = %segment, platforms = labels.len(), "[COLLECT] Resolved matrix configuration");
    Ok(locator.configuration(segment))
}

async fn test_results_source<F>(
    fetcher: &F,
    configuration: &JobLocator,
    options: &CollectOptions,
) -> MetricsResult<Fragment>
where
    F: Fetcher + ?Sized,
{
    let name = &options.test_report_artifact;
    let body = match &options.workspace {
        Some(root) => read_artifact(&test_output_path(root, &configuration.job, name)).await?,
        None => fetch(fetcher, configuration, &artifact_suffix(name)).await?,
    };
    Ok(Fragment::TestResults(tally_report(&body)?))
}

async fn ci_message_source<F>(
    fetcher: &F,
    configuration: &JobLocator,
    options: &CollectOptions,
) -> MetricsResult<Fragment>
where
    F: Fetcher + ?Sized,
{
    let name = &options.ci_message_artifact;
    let body = match &options.workspace {
        Some(root) => read_artifact(&root_artifact_path(root, name)).await,
        None => fetch(fetcher, configuration, &artifact_suffix(name)).await,
    };
    let message = match (body.and_then(|b| decode_ci_message(&b)), &options.fallback_message) {
        (Ok(message), _) => message,
        (Err(e), Some(fallback)) => {
            warn!(error = %e, "[COLLECT] CI message unusable, substituting fallback message");
            decode_ci_message(fallback)?
        }
        (Err(e), None) => return Err(e),
    };
    Ok(Fragment::CiMessage(message))
}

async fn run_sources<F>(
    fetcher: &F,
    locator: &JobLocator,
    distro: &Distro,
    options: &CollectOptions,
) -> MetricsResult<Accumulator>
where
    F: Fetcher + ?Sized,
{
    let mut in_flight: FuturesUnordered<BoxFuture<'_, MetricsResult<Step>>> =
        FuturesUnordered::new();
    in_flight.push(trigger_source(fetcher, locator).map_ok(Step::Fragment).boxed());
    in_flight.push(job_time_source(fetcher, locator).map_ok(Step::Fragment).boxed());
    in_flight.push(env_vars_source(fetcher, locator).map_ok(Step::Fragment).boxed());
    in_flight.push(
        configuration_source(fetcher, locator, distro)
            .map_ok(Step::Configuration)
            .boxed(),
    );

    let mut aggregator = Aggregator::new();
    while let Some(step) = in_flight.next().await {
        match step {
            Ok(Step::Fragment(fragment)) => {
                let kind = fragment.kind();
                let state = aggregator.accept(fragment);
                info!(fragment = %kind, ?state, "[COLLECT] Source completed");
            }
            Ok(Step::Configuration(configuration)) => {
                let report_configuration = configuration.clone();
                in_flight.push(
                    async move { test_results_source(fetcher, &report_configuration, options).await }
                        .map_ok(Step::Fragment)
                        .boxed(),
                );
                in_flight.push(
                    async move { ci_message_source(fetcher, &configuration, options).await }
                        .map_ok(Step::Fragment)
                        .boxed(),
                );
            }
            Err(e) => {
                aggregator.fail();
                error!(error = %e, missing = ?aggregator.missing(), "[COLLECT][ERROR] Source failed, abandoning run");
                return Err(e);
            }
        }
    }
    aggregator.finish()
}

/// Runs every source for one build and returns the merged accumulator.
pub async fn aggregate<F>(
    fetcher: &F,
    locator: &JobLocator,
    distro: &Distro,
    options: &CollectOptions,
) -> MetricsResult<Accumulator>
where
    F: Fetcher + ?Sized,
{
    info!(
        job = %locator.job,
        build = locator.build,
        variant = %distro.variant,
        arch = %distro.arch,
        "[COLLECT] Starting aggregation"
    );
    let run = run_sources(fetcher, locator, distro, options);
    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
            error!(timeout = ?limit, "[COLLECT][ERROR] Aggregation timed out");
            MetricsError::Timeout { elapsed: limit }
        })?,
        None => run.await,
    }
}

/// [`aggregate`] followed by [`assemble`]; the tier comes from the job name.
pub async fn collect_metrics<F>(
    fetcher: &F,
    locator: &JobLocator,
    distro: &Distro,
    metadata: &StaticMetadata,
    options: &CollectOptions,
) -> MetricsResult<MetricsRecord>
where
    F: Fetcher + ?Sized,
{
    let acc = aggregate(fetcher, locator, distro, options).await?;
    let tier = tier_from_job_name(&locator.job);
    let record = assemble(acc, distro, tier, metadata)?;
    info!(
        component = %record.component,
        trigger = %record.trigger,
        build_type = ?record.build_type,
        "[COLLECT] Metrics record assembled"
    );
    Ok(record)
}
