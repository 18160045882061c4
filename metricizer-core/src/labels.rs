//! Maps the runs of a multi-configuration (matrix) build to platforms.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{MetricsError, MetricsResult};
use crate::model::{Arch, Distro, Variant};

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRun {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct MatrixRuns {
    #[serde(default)]
    runs: Vec<MatrixRun>,
}

type ByVariant = BTreeMap<Variant, BTreeMap<Arch, String>>;

/// major -> variant -> arch -> run URL, for one build number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformLabels {
    by_major: BTreeMap<u32, ByVariant>,
}

fn platform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"RedHatEnterpriseLinux(\d+)-([A-Za-z]+)-([A-Za-z0-9_]+),")
            .expect("platform label pattern is valid")
    })
}

impl PlatformLabels {
    pub fn from_runs(runs: &[MatrixRun], build: u64) -> MetricsResult<Self> {
        let mut by_major: BTreeMap<u32, ByVariant> = BTreeMap::new();
        for run in runs.iter().filter(|r| r.number == build) {
            let Some(caps) = platform_pattern().captures(&run.url) else {
                debug!(url = %run.url, "Matrix run has no platform label");
                continue;
            };
            let (Ok(major), Ok(variant), Ok(arch)) = (
                caps[1].parse::<u32>(),
                caps[2].parse::<Variant>(),
                caps[3].parse::<Arch>(),
            ) else {
                debug!(url = %run.url, "Matrix run label names an unknown platform");
                continue;
            };
            by_major
                .entry(major)
                .or_default()
                .entry(variant)
                .or_default()
                .insert(arch, run.url.clone());
        }
        if by_major.is_empty() {
            return Err(MetricsError::LabelParse { build });
        }
        Ok(Self { by_major })
    }

    /// Run URL for the distro's major version, variant and arch.
    pub fn resolve(&self, distro: &Distro) -> MetricsResult<&str> {
        self.by_major
            .get(&distro.major)
            .and_then(|variants| variants.get(&distro.variant))
            .and_then(|archs| archs.get(&distro.arch))
            .map(String::as_str)
            .ok_or(MetricsError::DistroNotFound {
                major: distro.major,
                variant: distro.variant,
                arch: distro.arch,
            })
    }

    pub fn len(&self) -> usize {
        self.by_major
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_major.is_empty()
    }
}

/// Decodes `{"runs":[{"number":..,"url":..}]}` for `build`.
pub fn decode_matrix_runs(bytes: &[u8], build: u64) -> MetricsResult<PlatformLabels> {
    let parsed: MatrixRuns =
        serde_json::from_slice(bytes).map_err(|e| MetricsError::parse("matrix runs", e))?;
    PlatformLabels::from_runs(&parsed.runs, build)
}

/// The path segment naming a configuration inside a run URL, e.g.
/// `PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm` out of
/// `.../job/J/PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm/13/`.
pub fn configuration_segment(run_url: &str) -> Option<&str> {
    run_url
        .trim_end_matches('/')
        .split('/')
        .rev()
        .find(|segment| platform_pattern().is_match(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://jenkins.example.com/view/QE-RHEL7.5/job/rhsm-rhel-7.5-AllDistros-Tier1Tests/PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm/13/";

    fn distro(variant: Variant, arch: Arch) -> Distro {
        Distro {
            major: 7,
            minor: Some(5),
            variant,
            arch,
        }
    }

    #[test]
    fn resolves_the_requested_platform() {
        let runs = vec![MatrixRun {
            number: 13,
            url: URL.into(),
        }];
        let labels = PlatformLabels::from_runs(&runs, 13).unwrap();
        assert_eq!(labels.resolve(&distro(Variant::Server, Arch::X86_64)).unwrap(), URL);
        assert!(matches!(
            labels.resolve(&distro(Variant::Server, Arch::S390x)),
            Err(MetricsError::DistroNotFound {
                major: 7,
                variant: Variant::Server,
                arch: Arch::S390x
            })
        ));
    }

    #[test]
    fn major_version_selects_between_same_platforms() {
        let rhel8 = URL
            .replace("RedHatEnterpriseLinux7", "RedHatEnterpriseLinux8")
            .replace("rhel-7.5", "rhel-8.0");
        let runs = vec![
            MatrixRun {
                number: 13,
                url: URL.into(),
            },
            MatrixRun {
                number: 13,
                url: rhel8.clone(),
            },
        ];
        let labels = PlatformLabels::from_runs(&runs, 13).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.resolve(&distro(Variant::Server, Arch::X86_64)).unwrap(), URL);

        let mut eight = distro(Variant::Server, Arch::X86_64);
        eight.major = 8;
        assert_eq!(labels.resolve(&eight).unwrap(), rhel8);

        eight.major = 9;
        assert!(matches!(
            labels.resolve(&eight),
            Err(MetricsError::DistroNotFound { major: 9, .. })
        ));
    }

    #[test]
    fn other_build_numbers_are_ignored() {
        let body = format!(
            r#"{{"runs":[{{"number":12,"url":"{}"}},{{"number":13,"url":"{}"}}]}}"#,
            URL.replace("x86_64", "ppc64le").replace("/13/", "/12/"),
            URL
        );
        let labels = decode_matrix_runs(body.as_bytes(), 13).unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels.resolve(&distro(Variant::Server, Arch::Ppc64le)).is_err());
    }

    #[test]
    fn unlabelled_runs_fail_to_parse() {
        let body = br#"{"runs":[{"number":13,"url":"https://jenkins.example.com/job/plain/13/"}]}"#;
        assert!(matches!(
            decode_matrix_runs(body, 13),
            Err(MetricsError::LabelParse { build: 13 })
        ));
    }

    #[test]
    fn extracts_the_configuration_segment() {
        assert_eq!(
            configuration_segment(URL),
            Some("PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm")
        );
        assert_eq!(configuration_segment("https://jenkins.example.com/job/x/1/"), None);
    }
}
