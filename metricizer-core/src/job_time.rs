use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, MetricsResult};

/// When a build started: epoch milliseconds plus the same instant as ISO-8601.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTime {
    pub epoch: i64,
    pub time: String,
}

#[derive(Deserialize)]
struct Timestamp {
    timestamp: i64,
}

/// `2017-10-10T01:11:58.523Z` style, always UTC with millisecond precision.
pub fn iso8601_millis(epoch_ms: i64) -> MetricsResult<String> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| MetricsError::parse("timestamp", format!("{epoch_ms} is out of range")))
}

pub fn decode_job_time(bytes: &[u8]) -> MetricsResult<JobTime> {
    let ts: Timestamp =
        serde_json::from_slice(bytes).map_err(|e| MetricsError::parse("build timestamp", e))?;
    Ok(JobTime {
        epoch: ts.timestamp,
        time: iso8601_millis(ts.timestamp)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_jenkins_timestamp() {
        let t = decode_job_time(br#"{"_class":"hudson.matrix.MatrixBuild","timestamp":1507597918523}"#)
            .unwrap();
        assert_eq!(t.epoch, 1507597918523);
        assert_eq!(t.time, "2017-10-10T01:11:58.523Z");
    }

    #[test]
    fn missing_timestamp_is_a_parse_error() {
        assert!(matches!(
            decode_job_time(b"{}"),
            Err(MetricsError::Parse { .. })
        ));
    }
}
