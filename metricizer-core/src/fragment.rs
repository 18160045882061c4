//! Fragments: the single typed value each source pipeline produces, and the
//! accumulator they are merged into.

use serde::Serialize;
use std::fmt;

use crate::env_vars::EnvVars;
use crate::job_time::JobTime;
use crate::message::CiMessage;
use crate::report::TestReport;
use crate::trigger::Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentKind {
    Trigger,
    TestResults,
    CiMessage,
    CiTime,
    EnvVars,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 5] = [
        FragmentKind::Trigger,
        FragmentKind::TestResults,
        FragmentKind::CiMessage,
        FragmentKind::CiTime,
        FragmentKind::EnvVars,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Trigger => "trigger",
            FragmentKind::TestResults => "test-results",
            FragmentKind::CiMessage => "ci-message",
            FragmentKind::CiTime => "ci-time",
            FragmentKind::EnvVars => "env-vars",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Trigger(Trigger),
    TestResults(TestReport),
    CiMessage(CiMessage),
    CiTime(JobTime),
    EnvVars(EnvVars),
}

impl Fragment {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Fragment::Trigger(_) => FragmentKind::Trigger,
            Fragment::TestResults(_) => FragmentKind::TestResults,
            Fragment::CiMessage(_) => FragmentKind::CiMessage,
            Fragment::CiTime(_) => FragmentKind::CiTime,
            Fragment::EnvVars(_) => FragmentKind::EnvVars,
        }
    }
}

/// One slot per fragment kind; every slot starts empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Accumulator {
    pub trigger: Option<Trigger>,
    pub test_results: TestReport,
    pub brew_task_id: String,
    pub components: Vec<String>,
    pub create_time: String,
    pub epoch: i64,
    pub env_vars: EnvVars,
}

impl Accumulator {
    /// Overwrites the slot matching the fragment's kind.
    pub fn merge(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Trigger(t) => self.trigger = Some(t),
            Fragment::TestResults(r) => self.test_results = r,
            Fragment::CiMessage(m) => {
                self.brew_task_id = m.brew_task_id;
                self.components = m.components;
            }
            Fragment::CiTime(t) => {
                self.create_time = t.time;
                self.epoch = t.epoch;
            }
            Fragment::EnvVars(vars) => self.env_vars = vars,
        }
    }
}
