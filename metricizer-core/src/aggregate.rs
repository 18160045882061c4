//! The merge target of one run and the state it is in.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{MetricsError, MetricsResult};
use crate::fragment::{Accumulator, Fragment, FragmentKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationState {
    /// No source has completed yet.
    Pending,
    /// Some, but not all, sources have completed.
    Partial,
    Complete,
    Failed,
}

impl AggregationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AggregationState::Complete | AggregationState::Failed)
    }
}

/// Tracks which of the five sources have completed and merges their
/// fragments. Once `Complete` or `Failed`, nothing is merged any more.
#[derive(Debug, Default)]
pub struct Aggregator {
    acc: Accumulator,
    completed: BTreeSet<FragmentKind>,
    failed: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AggregationState {
        if self.failed {
            AggregationState::Failed
        } else if self.completed.len() == FragmentKind::ALL.len() {
            AggregationState::Complete
        } else if self.completed.is_empty() {
            AggregationState::Pending
        } else {
            AggregationState::Partial
        }
    }

    /// Merges a completed source's fragment and returns the new state.
    pub fn accept(&mut self, fragment: Fragment) -> AggregationState {
        let state = self.state();
        let kind = fragment.kind();
        if state.is_terminal() {
            warn!(fragment = %kind, ?state, "Dropping fragment that arrived after the run ended");
            return state;
        }
        self.acc.merge(fragment);
        self.completed.insert(kind);
        let state = self.state();
        debug!(fragment = %kind, received = self.completed.len(), ?state, "Merged fragment");
        state
    }

    pub fn fail(&mut self) {
        if self.state() != AggregationState::Complete {
            self.failed = true;
        }
    }

    pub fn missing(&self) -> Vec<FragmentKind> {
        FragmentKind::ALL
            .into_iter()
            .filter(|k| !self.completed.contains(k))
            .collect()
    }

    /// Hands out the accumulator; only a complete run has one to give.
    pub fn finish(self) -> MetricsResult<Accumulator> {
        match self.state() {
            AggregationState::Complete => Ok(self.acc),
            _ => Err(MetricsError::Incomplete {
                missing: self.missing(),
            }),
        }
    }
}
