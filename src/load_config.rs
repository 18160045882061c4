//! `load_config` module: loads a static YAML config and injects the Jenkins
//! secret from the environment.
//!
//! This is the only place where the YAML file is parsed and mapped onto the
//! strongly-typed configuration the rest of the CLI passes down explicitly.
//!
//! # Responsibilities
//! - Parse the YAML file into intermediate, serde-facing structs
//! - Inject `JENKINS_PASSWORD` (and `JENKINS_USER` when the file has no user)
//! - Turn the artifacts section into [`CollectOptions`]
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use metricizer_core::assemble::StaticMetadata;
use metricizer_core::collect::{CollectOptions, DEFAULT_CI_MESSAGE_ARTIFACT, DEFAULT_TEST_REPORT};
use metricizer_core::message::DEFAULT_CI_MESSAGE;
use metricizer_core::model::Credentials;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct JenkinsSection {
    url: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    accept_invalid_certs: bool,
    #[serde(default)]
    timeout_secs: Option<u64>,
    /// Bound on a whole collection run.
    #[serde(default)]
    run_timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ArtifactsSection {
    #[serde(default = "default_test_report")]
    test_report: String,
    #[serde(default = "default_ci_message")]
    ci_message: String,
    /// Whether an unusable CI message may be replaced by a fallback.
    #[serde(default = "default_true")]
    fallback: bool,
    /// Fallback message file; the bundled default is used when unset.
    #[serde(default)]
    fallback_path: Option<PathBuf>,
    /// Build workspace to read the artifacts from instead of Jenkins.
    #[serde(default)]
    workspace: Option<PathBuf>,
}

fn default_test_report() -> String {
    DEFAULT_TEST_REPORT.to_string()
}

fn default_ci_message() -> String {
    DEFAULT_CI_MESSAGE_ARTIFACT.to_string()
}

impl Default for ArtifactsSection {
    fn default() -> Self {
        Self {
            test_report: default_test_report(),
            ci_message: default_ci_message(),
            fallback: true,
            fallback_path: None,
            workspace: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    jenkins: JenkinsSection,
    #[serde(default)]
    artifacts: ArtifactsSection,
    #[serde(default)]
    metadata: StaticMetadata,
}

/// Where Jenkins lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    pub url: String,
    pub credentials: Credentials,
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub request_timeout: Option<Duration>,
}

/// Fully merged configuration, built once and passed down.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub jenkins: JenkinsConfig,
    pub options: CollectOptions,
    pub metadata: StaticMetadata,
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let user = match raw.jenkins.user.clone().or_else(|| std::env::var("JENKINS_USER").ok()) {
        Some(user) => user,
        None => {
            error!("Jenkins user missing from config and JENKINS_USER not set");
            anyhow::bail!("jenkins.user is not configured and JENKINS_USER environment variable not set");
        }
    };

    let password = match std::env::var("JENKINS_PASSWORD") {
        Ok(password) => {
            info!("JENKINS_PASSWORD found in env");
            password
        }
        Err(e) => {
            error!(error = ?e, "JENKINS_PASSWORD environment variable not set");
            return Err(anyhow::anyhow!(
                "JENKINS_PASSWORD environment variable not set: {e}"
            ));
        }
    };

    let fallback_message = match (raw.artifacts.fallback, &raw.artifacts.fallback_path) {
        (false, _) => None,
        (true, None) => Some(DEFAULT_CI_MESSAGE.as_bytes().to_vec()),
        (true, Some(fallback_path)) => match fs::read(fallback_path) {
            Ok(bytes) => {
                info!(fallback_path = ?fallback_path, "Loaded fallback CI message");
                Some(bytes)
            }
            Err(e) => {
                error!(error = ?e, fallback_path = ?fallback_path, "Failed to read fallback CI message");
                return Err(anyhow::anyhow!(
                    "Failed to read fallback CI message {:?}: {}",
                    fallback_path,
                    e
                ));
            }
        },
    };

    let request_timeout = raw.jenkins.timeout_secs.map(Duration::from_secs);
    let options = CollectOptions {
        test_report_artifact: raw.artifacts.test_report,
        ci_message_artifact: raw.artifacts.ci_message,
        fallback_message,
        timeout: raw.jenkins.run_timeout_secs.map(Duration::from_secs),
        workspace: raw.artifacts.workspace,
    };

    info!(
        jenkins_url = %raw.jenkins.url,
        user = %user,
        team = %raw.metadata.team,
        fallback = options.fallback_message.is_some(),
        workspace = ?options.workspace,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        jenkins: JenkinsConfig {
            url: raw.jenkins.url,
            credentials: Credentials { user, password },
            accept_invalid_certs: raw.jenkins.accept_invalid_certs,
            request_timeout,
        },
        options,
        metadata: raw.metadata,
    })
}
