//! Tallies a TestNG/JUnit style XML report into one five-number summary.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MetricsError, MetricsResult};

/// Summary of every `testsuite` record in a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u64,
    pub failures: u64,
    pub errors: u64,
    pub passed: u64,
    /// Elapsed seconds.
    pub time: f64,
}

/// One `<property name=".." value=".."/>` from the report header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub tally: Tally,
    /// Top-level properties, in document order, untouched.
    pub properties: Vec<Property>,
}

#[derive(Default)]
struct SuiteCounts {
    tests: u64,
    failures: u64,
    errors: u64,
    skipped: u64,
    time: f64,
}

impl Tally {
    /// Folds one suite in; counters that leave `u64` reject the report.
    fn add(&mut self, s: &SuiteCounts) -> MetricsResult<()> {
        let overflow = || malformed("counter overflow");
        let not_passed = s
            .failures
            .checked_add(s.errors)
            .and_then(|n| n.checked_add(s.skipped))
            .ok_or_else(overflow)?;
        let failures = self.failures.checked_add(s.failures).ok_or_else(overflow)?;
        let errors = self.errors.checked_add(s.errors).ok_or_else(overflow)?;
        failures.checked_add(errors).ok_or_else(overflow)?;
        let time = self.time + s.time;
        if !time.is_finite() {
            return Err(malformed("elapsed time out of range"));
        }

        self.total = self.total.checked_add(s.tests).ok_or_else(overflow)?;
        self.failures = failures;
        self.errors = errors;
        self.time = time;
        self.passed += s.tests.saturating_sub(not_passed);
        Ok(())
    }
}

fn malformed(message: impl ToString) -> MetricsError {
    MetricsError::MalformedReport {
        message: message.to_string(),
    }
}

fn suite_counts(e: &BytesStart<'_>) -> MetricsResult<SuiteCounts> {
    let mut counts = SuiteCounts::default();
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        let value = attr.unescape_value().map_err(malformed)?;
        let value = value.trim();
        let int = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| malformed(format!("non-numeric counter {v:?}")))
        };
        match attr.key.as_ref() {
            b"tests" => counts.tests = int(value)?,
            b"failures" => counts.failures = int(value)?,
            b"errors" => counts.errors = int(value)?,
            b"skipped" => counts.skipped = int(value)?,
            b"time" => {
                let time = value
                    .parse::<f64>()
                    .map_err(|_| malformed(format!("non-numeric time {value:?}")))?;
                if !time.is_finite() || time < 0.0 {
                    return Err(malformed(format!("time out of range {value:?}")));
                }
                counts.time = time;
            }
            _ => {}
        }
    }
    Ok(counts)
}

fn property(e: &BytesStart<'_>) -> MetricsResult<Property> {
    let mut prop = Property {
        name: String::new(),
        value: String::new(),
    };
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        match attr.key.as_ref() {
            b"name" => prop.name = attr.unescape_value().map_err(malformed)?.into_owned(),
            b"value" => prop.value = attr.unescape_value().map_err(malformed)?.into_owned(),
            _ => {}
        }
    }
    Ok(prop)
}

/// Folds every `testsuite` element, wherever it sits, exactly once.
pub fn tally_report(xml: &[u8]) -> MetricsResult<TestReport> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut report = TestReport::default();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut saw_root = false;
    let mut suites = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) => {
                saw_root = true;
                visit(&e, &stack, &mut report, &mut suites)?;
                stack.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => {
                saw_root = true;
                visit(&e, &stack, &mut report, &mut suites)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(malformed("document has no root element"));
    }
    if !stack.is_empty() {
        return Err(malformed("document ended inside an open element"));
    }
    debug!(suites, total = report.tally.total, "Tallied test report");
    Ok(report)
}

fn visit(
    e: &BytesStart<'_>,
    stack: &[Vec<u8>],
    report: &mut TestReport,
    suites: &mut usize,
) -> MetricsResult<()> {
    match e.name().as_ref() {
        b"testsuite" => {
            report.tally.add(&suite_counts(e)?)?;
            *suites += 1;
        }
        b"property" if stack.len() == 2 && stack[1] == b"properties" => {
            report.properties.push(property(e)?);
        }
        _ => {}
    }
    Ok(())
}
