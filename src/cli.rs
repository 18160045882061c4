//! Command-line surface of metricizer.
//!
//! # Subcommands
//! - `collect`: one build in, one metrics record out (stdout or `--output`)
//! - `serve`: the same collection behind `POST /cimetrics`
//!
//! Both read the YAML config through [`load_config`]; flags given on the
//! command line win over the file.
//!
//! # Usage
//! ```text
//! metricizer collect --config metricizer.yaml --job rhsm-rhel-7.5-AllDistros-Tier1Tests \
//!     --build 13 --tab QE-RHEL7.5 --major 7 --minor 5 --variant Server --arch x86_64
//! metricizer serve --config metricizer.yaml --listen 0.0.0.0:4000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metricizer_core::collect::collect_metrics;
use metricizer_core::model::{Arch, Distro, JobLocator, Variant};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::jenkins::JenkinsClient;
use crate::load_config::load_config;
use crate::serve::serve;

/// CLI for metricizer: turn one Jenkins build into a CI metrics record.
#[derive(Parser)]
#[clap(
    name = "metricizer",
    version,
    about = "Collect Jenkins build and test-report data into a CI metrics JSON record"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect the metrics record for one build of a matrix job
    Collect {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Jenkins job name
        #[clap(long)]
        job: String,
        /// Build number
        #[clap(long)]
        build: u64,
        /// Jenkins view the job lives under; empty for none
        #[clap(long, default_value = "")]
        tab: String,
        /// RHEL major version
        #[clap(long)]
        major: u32,
        /// RHEL minor version
        #[clap(long)]
        minor: Option<u32>,
        /// RHEL variant, e.g. Server
        #[clap(long)]
        variant: Variant,
        /// CPU architecture, e.g. x86_64
        #[clap(long)]
        arch: Arch,
        /// Write the record here instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
        /// Fail instead of substituting the fallback CI message
        #[clap(long)]
        no_fallback: bool,
        /// Read the test report and CI message from this build workspace
        #[clap(long)]
        workspace: Option<PathBuf>,
    },
    /// Serve metrics collection over HTTP at POST /cimetrics
    Serve {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Address to listen on
        #[clap(long, default_value = "127.0.0.1:4000")]
        listen: SocketAddr,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Collect {
            config,
            job,
            build,
            tab,
            major,
            minor,
            variant,
            arch,
            output,
            no_fallback,
            workspace,
        } => {
            let mut config = load_config(config)?;
            if no_fallback {
                config.options.fallback_message = None;
            }
            if workspace.is_some() {
                config.options.workspace = workspace;
            }

            let client = JenkinsClient::new(&config.jenkins)
                .context("Failed to build Jenkins HTTP client")?;
            let locator = JobLocator {
                jenkins_url: config.jenkins.url.clone(),
                tab,
                job,
                build,
                credentials: config.jenkins.credentials.clone(),
            };
            let distro = Distro {
                major,
                minor,
                variant,
                arch,
            };

            let record = match collect_metrics(
                &client,
                &locator,
                &distro,
                &config.metadata,
                &config.options,
            )
            .await
            {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(error = %e, "Collection failed");
                    return Err(anyhow::Error::new(e).context("Collection failed"));
                }
            };

            let json = serde_json::to_string_pretty(&record)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write record to {path:?}"))?;
                    println!("Metrics record written to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Commands::Serve { config, listen } => {
            let config = load_config(config)?;
            serve(config, listen).await
        }
    }
}
