//! metricizer: collects one Jenkins build into a CI metrics record.
//!
//! The aggregation engine lives in `metricizer_core`; this crate supplies what
//! it needs from the outside world:
//! - [`jenkins::JenkinsClient`], the reqwest-backed fetcher
//! - [`load_config`], the YAML config with secrets from the environment
//! - [`cli`] and [`serve`], the two ways a record is delivered
//!
//! # Navigation
//! - Entrypoint for `main()` and tests: [`run`]

pub mod cli;
pub mod jenkins;
pub mod load_config;
pub mod serve;

pub use cli::{run, Cli, Commands};
