//! `serve` module: the metrics collection behind an HTTP endpoint.
//!
//! `POST /cimetrics` takes `{"distro": {...}, "jenkins": {...}}`, runs one
//! collection and answers with the pretty-printed record. Any failure answers
//! `400` with `{"message": "Unable to get CI Metrics JSON"}`; the details go
//! to the log only.
//!
//! # Request shape
//! - `distro`: `major`, optional `minor`, `variant`, `arch`
//! - `jenkins`: `job`, `build`, optional `tab`; `jenkins_url`, `user` and `pw`
//!   override the configured server and credentials for that request
//!
//! Every request is bounded by the configured run timeout, or
//! [`DEFAULT_RESPONSE_TIMEOUT`] when none is set.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use metricizer_core::collect::collect_metrics;
use metricizer_core::model::{Credentials, Distro, JobLocator};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::jenkins::JenkinsClient;
use crate::load_config::CliConfig;

pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

const FAILURE_MESSAGE: &str = "Unable to get CI Metrics JSON";

/// The Jenkins build a request asks about.
#[derive(Debug, Deserialize)]
pub struct JenkinsJob {
    #[serde(default)]
    pub jenkins_url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pw: Option<String>,
    #[serde(default)]
    pub tab: String,
    pub job: String,
    pub build: u64,
}

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    pub distro: Distro,
    pub jenkins: JenkinsJob,
}

/// Shared by every request.
pub struct AppState {
    client: JenkinsClient,
    config: CliConfig,
}

impl AppState {
    pub fn new(mut config: CliConfig) -> Result<Self> {
        config.options.timeout = Some(config.options.timeout.unwrap_or(DEFAULT_RESPONSE_TIMEOUT));
        let client = JenkinsClient::new(&config.jenkins)
            .context("Failed to build Jenkins HTTP client")?;
        Ok(Self { client, config })
    }

    fn locator(&self, job: JenkinsJob) -> JobLocator {
        let configured = &self.config.jenkins;
        JobLocator {
            jenkins_url: job.jenkins_url.unwrap_or_else(|| configured.url.clone()),
            tab: job.tab,
            job: job.job,
            build: job.build,
            credentials: Credentials {
                user: job.user.unwrap_or_else(|| configured.credentials.user.clone()),
                password: job
                    .pw
                    .unwrap_or_else(|| configured.credentials.password.clone()),
            },
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cimetrics", post(cimetrics))
        .with_state(state)
}

async fn cimetrics(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MetricsRequest>,
) -> Response {
    let locator = state.locator(request.jenkins);
    info!(job = %locator.job, build = locator.build, "Metrics requested");

    let record = collect_metrics(
        &state.client,
        &locator,
        &request.distro,
        &state.config.metadata,
        &state.config.options,
    )
    .await;

    match record.map(|r| serde_json::to_string_pretty(&r)) {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to serialise metrics record");
            failure()
        }
        Err(e) => {
            error!(error = %e, job = %locator.job, build = locator.build, "Collection failed");
            failure()
        }
    }
}

fn failure() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": FAILURE_MESSAGE })),
    )
        .into_response()
}

/// Serves `/cimetrics` on `addr` until interrupted.
pub async fn serve(config: CliConfig, addr: SocketAddr) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "Running cimetrics service");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Metrics service failed")
}
