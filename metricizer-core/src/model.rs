//! Input descriptors: which platform a run is for, and which Jenkins build to read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RHEL variant as it appears in matrix platform labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    Server,
    Workstation,
    Client,
    ComputeNode,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Server => "Server",
            Variant::Workstation => "Workstation",
            Variant::Client => "Client",
            Variant::ComputeNode => "ComputeNode",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Server" => Ok(Variant::Server),
            "Workstation" => Ok(Variant::Workstation),
            "Client" => Ok(Variant::Client),
            "ComputeNode" => Ok(Variant::ComputeNode),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

/// CPU architecture. `x8664` is accepted on input and collapsed to `x86_64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    I386,
    #[serde(rename = "x86_64", alias = "x8664")]
    X86_64,
    Aarch64,
    Ppc64,
    Ppc64le,
    S390,
    S390x,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::I386 => "i386",
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Ppc64 => "ppc64",
            Arch::Ppc64le => "ppc64le",
            Arch::S390 => "s390",
            Arch::S390x => "s390x",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i386" => Ok(Arch::I386),
            "x86_64" | "x8664" => Ok(Arch::X86_64),
            "aarch64" => Ok(Arch::Aarch64),
            "ppc64" => Ok(Arch::Ppc64),
            "ppc64le" => Ok(Arch::Ppc64le),
            "s390" => Ok(Arch::S390),
            "s390x" => Ok(Arch::S390x),
            other => Err(format!("unknown arch: {other}")),
        }
    }
}

/// Target platform for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distro {
    pub major: u32,
    #[serde(default)]
    pub minor: Option<u32>,
    pub variant: Variant,
    pub arch: Arch,
}

impl Distro {
    /// `RHEL 7.5`, or `RHEL 7.` when no minor version is known.
    pub fn base_distro(&self) -> String {
        let minor = self.minor.map(|m| m.to_string()).unwrap_or_default();
        format!("RHEL {}.{}", self.major, minor)
    }
}

/// Basic-auth credentials for the Jenkins API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Addresses one build of one Jenkins job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLocator {
    pub jenkins_url: String,
    /// View (tab) name; empty when the job is not addressed through a view.
    pub tab: String,
    pub job: String,
    pub build: u64,
    pub credentials: Credentials,
}

impl JobLocator {
    /// Locator for one configuration of a matrix job, e.g.
    /// `PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm`.
    pub fn configuration(&self, segment: &str) -> JobLocator {
        JobLocator {
            job: format!("{}/{}", self.job, segment),
            ..self.clone()
        }
    }
}
