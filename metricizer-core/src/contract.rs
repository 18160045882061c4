//! # contract: the seam between the aggregation engine and the transport
//!
//! The engine never talks HTTP itself. Everything it needs from Jenkins goes
//! through the [`Fetcher`] trait: one URL in, raw bytes out. The CLI crate
//! provides the reqwest-backed implementation; tests use the generated
//! [`MockFetcher`].
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can script responses per URL.
//! - Mocks are exported behind the `test-export-mocks` feature (on by default)
//!   so integration tests in other crates can use them too.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::MetricsResult;
use crate::model::Credentials;

/// Fetch capability: `fetch(url, credentials) -> bytes | FetchError`.
///
/// Implementors map transport failures and non-success statuses to
/// [`MetricsError::Fetch`](crate::error::MetricsError::Fetch).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, credentials: &Credentials) -> MetricsResult<Vec<u8>>;
}
