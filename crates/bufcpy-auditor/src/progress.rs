// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Live progress shared between the runner and the debug server.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bufcpy_core::Operation;
use serde::Serialize;

use crate::report::RoundSummary;

/// What the runner is doing right now.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Operation of the current round.
    pub operation: Option<Operation>,
    /// Buffer size of the current round.
    pub bufsize: Option<usize>,
    /// Trial in flight, e.g. `recursive_memcpy (cpus=2 depth=4)`.
    pub trial: Option<String>,
    /// Trials finished so far, across rounds.
    pub completed_trials: u64,
    /// Rounds finished so far.
    pub completed_rounds: usize,
}

#[derive(Default)]
struct State {
    status: Status,
    rounds: Vec<RoundSummary>,
}

/// Cheaply cloneable handle to the shared progress state.
#[derive(Clone, Default)]
pub struct Progress {
    inner: Arc<Mutex<State>>,
}

impl Progress {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the start of a round.
    pub fn begin_round(&self, operation: Operation, bufsize: usize) {
        let mut state = self.lock();
        state.status.operation = Some(operation);
        state.status.bufsize = Some(bufsize);
        state.status.trial = None;
    }

    /// Marks the start of a trial.
    pub fn begin_trial(&self, name: String) {
        self.lock().status.trial = Some(name);
    }

    /// Marks the end of the trial in flight.
    pub fn finish_trial(&self) {
        let mut state = self.lock();
        state.status.trial = None;
        state.status.completed_trials += 1;
    }

    /// Records a finished round.
    pub fn finish_round(&self, summary: RoundSummary) {
        let mut state = self.lock();
        state.rounds.push(summary);
        state.status.completed_rounds = state.rounds.len();
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> Status {
        self.lock().status.clone()
    }

    /// Summaries of every finished round.
    pub fn rounds(&self) -> Vec<RoundSummary> {
        self.lock().rounds.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RoundReport;
    use std::time::Duration;

    #[test]
    fn tracks_trials_and_rounds() {
        let progress = Progress::default();
        let handle = progress.clone();
        progress.begin_round(Operation::Compare, 4096);
        progress.begin_trial("memcmp".into());
        assert_eq!(handle.status().trial.as_deref(), Some("memcmp"));
        progress.finish_trial();

        let report = RoundReport::new(Operation::Compare, 4096, Duration::from_nanos(10), vec![], 10);
        progress.finish_round(report.summary());

        let status = handle.status();
        assert_eq!(status.operation, Some(Operation::Compare));
        assert_eq!(status.bufsize, Some(4096));
        assert_eq!(status.trial, None);
        assert_eq!(status.completed_trials, 1);
        assert_eq!(status.completed_rounds, 1);
        assert_eq!(handle.rounds().len(), 1);
    }
}
