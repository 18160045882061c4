//! Decodes the brew build message that triggered a CI run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};

/// Architecture keys of `rpms`, in the order they are preferred.
pub const ARCH_PRIORITY: [&str; 7] = [
    "i386", "x86_64", "ppc64", "ppc64le", "aarch64", "s390", "s390x",
];

/// Message shipped with the crate, used when the build's own message is
/// unavailable.
pub const DEFAULT_CI_MESSAGE: &str = include_str!("../resources/default_ci_message.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiMessage {
    pub brew_task_id: String,
    pub components: Vec<String>,
}

fn malformed(message: impl ToString) -> MetricsError {
    MetricsError::MalformedMessage {
        message: message.to_string(),
    }
}

pub fn decode_ci_message(bytes: &[u8]) -> MetricsResult<CiMessage> {
    let msg: Value = serde_json::from_slice(bytes).map_err(malformed)?;

    let brew_task_id = match msg.pointer("/build/task_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(malformed(format!("build.task_id is not an id: {other}"))),
        None => return Err(malformed("missing build.task_id")),
    };

    let components = match msg.get("rpms").and_then(Value::as_object) {
        Some(rpms) => match ARCH_PRIORITY.iter().find_map(|arch| rpms.get(*arch)) {
            Some(list) => list
                .as_array()
                .ok_or_else(|| malformed("rpms entry is not a list"))?
                .iter()
                .map(|c| {
                    c.as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| malformed("component name is not a string"))
                })
                .collect::<MetricsResult<Vec<_>>>()?,
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    Ok(CiMessage {
        brew_task_id,
        components,
    })
}
