// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-round results: ranking, winner, delta against the baseline, and the
//! table / JSON renderings.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use bufcpy_core::{Operation, Strategy, StrategyKind};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::size::format_size;

/// One timed strategy/parameter/pool combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trial {
    /// Strategy that ran.
    pub strategy: Strategy,
    /// Routine-style name, e.g. `partitioned_memcpy`.
    pub label: &'static str,
    /// Parts or depth; `None` for direct strategies.
    pub param: Option<usize>,
    /// Worker-pool size; `None` when not run on a sized pool.
    pub cpus: Option<usize>,
    /// Mean duration of one call.
    pub mean: Duration,
}

impl Trial {
    /// `cpus=4 parts=6`, `depth=3`, or empty for direct strategies.
    pub fn params(&self) -> String {
        let mut out = String::new();
        if let Some(cpus) = self.cpus {
            let _ = write!(out, "cpus={cpus}");
        }
        if let Some(param) = self.param {
            let name = match self.strategy.kind {
                StrategyKind::Recursive => "depth",
                _ => "parts",
            };
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{name}={param}");
        }
        out
    }

    fn summary(&self) -> TrialSummary {
        TrialSummary {
            label: self.label,
            strategy: self.strategy,
            param: self.param,
            cpus: self.cpus,
            mean_ns: nanos(self.mean),
        }
    }
}

/// How much the winner beat the baseline by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delta {
    /// Baseline minus winner.
    pub saved: Duration,
    /// `saved` as a percentage of the baseline.
    pub percent: f64,
}

/// Results of one (operation, buffer size) round, fastest first.
#[derive(Clone, Debug)]
pub struct RoundReport {
    /// Operation timed.
    pub operation: Operation,
    /// Buffer length in bytes.
    pub bufsize: usize,
    /// Mean of the native direct strategy.
    pub baseline: Duration,
    /// Every trial, sorted by mean duration.
    pub trials: Vec<Trial>,
    /// Rows to show.
    pub top: usize,
}

impl RoundReport {
    /// Ranks `trials`; ties keep their run order.
    pub fn new(
        operation: Operation,
        bufsize: usize,
        baseline: Duration,
        mut trials: Vec<Trial>,
        top: usize,
    ) -> Self {
        trials.sort_by_key(|t| t.mean);
        Self {
            operation,
            bufsize,
            baseline,
            trials,
            top,
        }
    }

    /// Fastest trial.
    pub fn winner(&self) -> Option<&Trial> {
        self.trials.first()
    }

    /// The first `top` trials.
    pub fn top_trials(&self) -> &[Trial] {
        &self.trials[..self.top.min(self.trials.len())]
    }

    /// Winner's margin over the baseline, when it is strictly faster.
    pub fn delta(&self) -> Option<Delta> {
        let winner = self.winner()?;
        if winner.mean >= self.baseline {
            return None;
        }
        let saved = self.baseline - winner.mean;
        let percent = saved.as_secs_f64() / self.baseline.as_secs_f64() * 100.0;
        Some(Delta { saved, percent })
    }

    /// Name of the baseline routine, e.g. `copy()`.
    pub fn baseline_name(&self) -> String {
        format!("{}()", Strategy::BASELINE.label(self.operation))
    }

    /// Ranked table of the top trials.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "routine", "params", "mean"]);
        for (rank, trial) in self.top_trials().iter().enumerate() {
            table.add_row(vec![
                Cell::new(rank + 1).set_alignment(CellAlignment::Right),
                Cell::new(trial.label),
                Cell::new(trial.params()),
                Cell::new(format!("{:?}", trial.mean)).set_alignment(CellAlignment::Right),
            ]);
        }
        table
    }

    /// Heading, table, winner and delta lines.
    pub fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        let size = format_size(self.bufsize as u64, 2);
        writeln!(out, "=== {} {size} ===", self.operation)?;
        writeln!(out, "Top {} of {}:", self.top_trials().len(), self.trials.len())?;
        writeln!(out, "{}", self.table())?;
        if let Some(winner) = self.winner() {
            writeln!(
                out,
                "{} winner: {} ({}) {:?}",
                self.operation,
                winner.label,
                winner.params(),
                winner.mean
            )?;
        }
        if let Some(delta) = self.delta() {
            writeln!(
                out,
                "Delta: {:?} {:.2}% faster than {} ({:?})",
                delta.saved,
                delta.percent,
                self.baseline_name(),
                self.baseline
            )?;
        }
        writeln!(out)
    }

    /// Serializable digest, used for `--json` and the debug server.
    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            operation: self.operation,
            bufsize: self.bufsize,
            bufsize_human: format_size(self.bufsize as u64, 2),
            baseline_ns: nanos(self.baseline),
            trials: self.trials.len(),
            winner: self.winner().map(Trial::summary),
            delta_percent: self.delta().map(|d| d.percent),
            top: self.top_trials().iter().map(Trial::summary).collect(),
        }
    }
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// JSON view of a [`RoundReport`].
#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    /// Operation timed.
    pub operation: Operation,
    /// Buffer length in bytes.
    pub bufsize: usize,
    /// Buffer length, human-readable.
    pub bufsize_human: String,
    /// Baseline mean in nanoseconds.
    pub baseline_ns: u64,
    /// Number of trials in the round.
    pub trials: usize,
    /// Fastest trial.
    pub winner: Option<TrialSummary>,
    /// Winner's margin over the baseline, when positive.
    pub delta_percent: Option<f64>,
    /// The top trials, fastest first.
    pub top: Vec<TrialSummary>,
}

/// JSON view of a [`Trial`].
#[derive(Clone, Debug, Serialize)]
pub struct TrialSummary {
    /// Routine-style name.
    pub label: &'static str,
    /// Strategy that ran.
    pub strategy: Strategy,
    /// Parts or depth.
    pub param: Option<usize>,
    /// Worker-pool size.
    pub cpus: Option<usize>,
    /// Mean duration in nanoseconds.
    pub mean_ns: u64,
}
