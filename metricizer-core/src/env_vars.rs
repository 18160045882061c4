//! Decodes the variables the EnvInject plugin recorded for a build.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::{MetricsError, MetricsResult};

pub type EnvVars = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct NameValue {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct EnvVarList {
    #[serde(rename = "envVar", default)]
    env_var: Vec<NameValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Export {
    Map {
        #[serde(rename = "envMap")]
        env_map: HashMap<String, String>,
    },
    Wrapped {
        #[serde(rename = "envVars")]
        env_vars: EnvVarList,
    },
    List(Vec<NameValue>),
}

/// Folds the export into a mapping. A repeated name keeps its last value.
///
/// Accepts the JSON shapes Jenkins versions have used and, failing that, the
/// plain `NAME=value` text export.
pub fn decode_env_vars(bytes: &[u8]) -> MetricsResult<EnvVars> {
    if let Ok(export) = serde_json::from_slice::<Export>(bytes) {
        let pairs: Vec<(String, String)> = match export {
            Export::Map { env_map } => env_map.into_iter().collect(),
            Export::Wrapped { env_vars } => env_vars
                .env_var
                .into_iter()
                .map(|nv| (nv.name, nv.value))
                .collect(),
            Export::List(list) => list.into_iter().map(|nv| (nv.name, nv.value)).collect(),
        };
        return Ok(pairs.into_iter().collect());
    }

    let text = std::str::from_utf8(bytes).map_err(|e| MetricsError::parse("injected variables", e))?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_owned(), v.to_owned()))
                .ok_or_else(|| {
                    MetricsError::parse("injected variables", format!("not NAME=value: {line:?}"))
                })
        })
        .collect()
}
