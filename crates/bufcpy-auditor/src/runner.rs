// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Executes an [`AuditPlan`] one round at a time.
//!
//! Buffer allocation, resetting `to` and timing live here; the engine only
//! ever sees a prepared buffer pair. Concurrent trials run inside a rayon
//! pool sized to each `--cpu` entry so the engine's pool dispatch fans out
//! over exactly that many workers.

use std::hint::black_box;
use std::time::{Duration, Instant};

use bufcpy_core::{buffer, EngineOptions, Operation, Strategy};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::plan::AuditPlan;
use crate::progress::Progress;
use crate::report::{RoundReport, Trial};
use crate::size::format_size;

/// A round that could not be completed.
#[derive(Debug, Error)]
pub enum RunError {
    /// Worker pool construction failed.
    #[error("could not build a {threads}-thread worker pool")]
    Pool {
        /// Requested size.
        threads: usize,
        /// Underlying failure.
        #[source]
        source: ThreadPoolBuildError,
    },
    /// A copy left the destination different from the source.
    #[error("{label} ({params}) left {diff} wrong bytes in a {size} buffer")]
    CorruptCopy {
        /// Routine name.
        label: &'static str,
        /// Trial parameters.
        params: String,
        /// Differing byte count.
        diff: usize,
        /// Buffer size, human-readable.
        size: String,
    },
    /// A compare reported identical buffers as different.
    #[error("{label} ({params}) reported identical {size} buffers as different")]
    FalseMismatch {
        /// Routine name.
        label: &'static str,
        /// Trial parameters.
        params: String,
        /// Buffer size, human-readable.
        size: String,
    },
}

/// Runs rounds of a plan, publishing progress as it goes.
pub struct Runner<'p> {
    plan: &'p AuditPlan,
    pools: Vec<(Option<usize>, Option<ThreadPool>)>,
    progress: Progress,
}

impl<'p> Runner<'p> {
    /// Builds one worker pool per `--cpu` entry.
    pub fn new(plan: &'p AuditPlan, progress: Progress) -> Result<Self, RunError> {
        let pools = plan
            .pool_sizes()
            .into_iter()
            .map(|size| match size {
                Some(threads) => ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(move |i| format!("bufcpy-{threads}-{i}"))
                    .build()
                    .map(|pool| (size, Some(pool)))
                    .map_err(|source| RunError::Pool { threads, source }),
                None => Ok((None, None)),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            plan,
            pools,
            progress,
        })
    }

    /// Times every selected strategy on one buffer size.
    pub fn run_round(&self, operation: Operation, bufsize: usize) -> Result<RoundReport, RunError> {
        let size = format_size(bufsize as u64, 2);
        info!(%operation, bufsize = %size, "round started");
        self.progress.begin_round(operation, bufsize);

        let mut from = vec![0u8; bufsize];
        buffer::fill_sequence(&mut from);
        let mut to = match operation {
            Operation::Copy => vec![0u8; bufsize],
            Operation::Compare => from.clone(),
        };

        let mut trials = Vec::new();
        let mut bench = |trial: Trial, pool: Option<&ThreadPool>| -> Result<Trial, RunError> {
            self.progress
                .begin_trial(format!("{} ({})", trial.label, trial.params()));
            let job = TrialJob {
                operation,
                options: self.plan.options,
                runs: self.plan.runs,
                trial,
                size: &size,
            };
            let to = &mut to;
            let from = &from;
            let timed = match pool {
                Some(pool) => pool.install(move || job.run(to, from)),
                None => job.run(to, from),
            }?;
            debug!(routine = timed.label, params = %timed.params(), mean = ?timed.mean, "trial finished");
            self.progress.finish_trial();
            Ok(timed)
        };

        let baseline = bench(direct_trial(operation, Strategy::BASELINE), None)?;
        let baseline_mean = baseline.mean;
        for strategy in self.plan.strategies.iter().filter(|s| !s.is_concurrent()) {
            if *strategy == Strategy::BASELINE {
                trials.push(baseline.clone());
            } else {
                trials.push(bench(direct_trial(operation, *strategy), None)?);
            }
        }

        for &strategy in self.plan.strategies.iter().filter(|s| s.is_concurrent()) {
            let mut params: Vec<usize> = Vec::new();
            for &requested in &self.plan.params {
                let param = AuditPlan::effective_param(strategy, requested);
                if params.contains(&param) {
                    continue;
                }
                params.push(param);
                for (cpus, pool) in &self.pools {
                    let trial = Trial {
                        strategy,
                        label: strategy.label(operation),
                        param: Some(param),
                        cpus: *cpus,
                        mean: Duration::ZERO,
                    };
                    trials.push(bench(trial, pool.as_ref())?);
                }
            }
        }

        let report = RoundReport::new(operation, bufsize, baseline_mean, trials, self.plan.top);
        if let Some(winner) = report.winner() {
            info!(%operation, bufsize = %size, winner = winner.label, params = %winner.params(), "round finished");
        }
        self.progress.finish_round(report.summary());
        Ok(report)
    }
}

fn direct_trial(operation: Operation, strategy: Strategy) -> Trial {
    Trial {
        strategy,
        label: strategy.label(operation),
        param: None,
        cpus: None,
        mean: Duration::ZERO,
    }
}

/// Everything one trial needs, movable into a worker pool.
struct TrialJob<'a> {
    operation: Operation,
    options: EngineOptions,
    runs: u32,
    trial: Trial,
    size: &'a str,
}

impl TrialJob<'_> {
    /// Runs the trial `runs` times and stores the mean in the returned trial.
    fn run(self, to: &mut [u8], from: &[u8]) -> Result<Trial, RunError> {
        let Self {
            operation,
            options,
            runs,
            mut trial,
            size,
        } = self;
        let strategy = trial.strategy;
        let param = trial.param.unwrap_or(0);
        let mut total = Duration::ZERO;
        match operation {
            Operation::Copy => {
                for _ in 0..runs {
                    buffer::zero(to);
                    let start = Instant::now();
                    strategy.copy(options, to, from, param);
                    total += start.elapsed();
                }
                let diff = buffer::diff_count(to, from);
                if diff != 0 {
                    return Err(RunError::CorruptCopy {
                        label: trial.label,
                        params: trial.params(),
                        diff,
                        size: size.to_owned(),
                    });
                }
            }
            Operation::Compare => {
                for _ in 0..runs {
                    let start = Instant::now();
                    let equal = black_box(strategy.compare(options, to, from, param));
                    total += start.elapsed();
                    if !equal {
                        return Err(RunError::FalseMismatch {
                            label: trial.label,
                            params: trial.params(),
                            size: size.to_owned(),
                        });
                    }
                }
            }
        }
        trial.mean = total / runs.max(1);
        Ok(trial)
    }
}
