//! Classifies what started a build from its recorded causes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MetricsError, MetricsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Manual,
    Brew,
    Timer,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Brew => "brew",
            Trigger::Timer => "timer",
        }
    }

    fn from_description(description: &str) -> Self {
        if description.contains("CI message") {
            Trigger::Brew
        } else if description.contains("Timer") {
            Trigger::Timer
        } else {
            Trigger::Manual
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct BuildActions {
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
struct Action {
    #[serde(default)]
    causes: Vec<Cause>,
}

#[derive(Debug, Deserialize)]
struct Cause {
    #[serde(rename = "shortDescription", default)]
    short_description: String,
}

/// First action with a cause decides; only its first cause is inspected.
pub fn classify_trigger(bytes: &[u8]) -> MetricsResult<Trigger> {
    let build: BuildActions =
        serde_json::from_slice(bytes).map_err(|e| MetricsError::parse("build actions", e))?;

    build
        .actions
        .iter()
        .find_map(|action| action.causes.first())
        .map(|cause| Trigger::from_description(&cause.short_description))
        .ok_or(MetricsError::NoTriggerFound)
}
