//! # jenkins: the HTTP side of the fetch contract
//!
//! [`JenkinsClient`] is the production [`Fetcher`]. Every Jenkins API call and
//! artifact download of a run goes through it with the run's credentials.
//!
//! ## Error Handling
//! - transport failures (DNS, TLS, timeouts) become [`MetricsError::Fetch`]
//! - non-success statuses become [`MetricsError::Fetch`] carrying the status
//!   and the first part of the response body
//!
//! No retries: one failed request fails the whole run.

use async_trait::async_trait;
use metricizer_core::contract::Fetcher;
use metricizer_core::model::Credentials;
use metricizer_core::{MetricsError, MetricsResult};
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::load_config::JenkinsConfig;

/// Longest slice of an error body kept in a fetch error.
const ERROR_BODY_LIMIT: usize = 256;

/// [`Fetcher`] over the Jenkins JSON API and artifact store.
///
/// Authenticates every request with HTTP basic auth. The client is shared by
/// every source of a run; reqwest pools the connections.
pub struct JenkinsClient {
    http: reqwest::Client,
}

impl JenkinsClient {
    pub fn new(config: &JenkinsConfig) -> Result<Self, reqwest::Error> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if config.accept_invalid_certs {
            warn!("TLS certificate verification disabled for Jenkins requests");
        }
        Ok(Self {
            http: builder.build()?,
        })
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl Fetcher for JenkinsClient {
    async fn fetch(&self, url: &str, credentials: &Credentials) -> MetricsResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .basic_auth(&credentials.user, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| MetricsError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(url, %status, "Jenkins rejected request");
            return Err(MetricsError::fetch(
                url,
                format!("HTTP {status}: {}", truncate(&body)),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MetricsError::fetch(url, e))?;
        Ok(bytes.to_vec())
    }
}
