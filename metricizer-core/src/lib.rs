#![doc = "metricizer-core: aggregation engine for CI metrics records."]

//! This crate turns one Jenkins build into one CI metrics record. It owns
//! every data model, decoder and the fan-out/fan-in engine. Network I/O goes
//! through a [`contract::Fetcher`]; the only I/O of its own is reading
//! artifacts out of a build [`workspace`] when one is configured.
//!
//! # Usage
//! Implement [`contract::Fetcher`] (the CLI crate ships a reqwest one), then
//! call [`collect::collect_metrics`].

pub mod aggregate;
pub mod assemble;
pub mod collect;
pub mod contract;
pub mod env_vars;
pub mod error;
pub mod fragment;
pub mod job_time;
pub mod labels;
pub mod message;
pub mod model;
pub mod report;
pub mod trigger;
pub mod url;
pub mod workspace;

pub use error::{MetricsError, MetricsResult};
