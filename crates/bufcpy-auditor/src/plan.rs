// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Audit settings (what a profile stores) and the validated plan the runner
//! executes.

use std::num::NonZeroUsize;
use std::thread;

use bufcpy_core::{Cancellation, Dispatch, EngineOptions, Operation, Strategy, StrategyKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::size::format_size;
use crate::step::{Step, MIN_ADD_STEP};

/// Deepest recursion the auditor will run (`2^16` leaves).
pub const MAX_DEPTH: usize = 16;

/// Benchmark settings, as saved in a profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Run the copy rounds.
    pub copy: bool,
    /// Run the compare rounds.
    pub compare: bool,
    /// Smallest buffer size in the sweep.
    pub bufmin: u64,
    /// Largest buffer size in the sweep.
    pub bufmax: u64,
    /// Single buffer size; overrides `bufmin`/`bufmax`.
    pub bufsize: Option<u64>,
    /// Sweep progression.
    pub step: Step,
    /// Worker-thread counts.
    pub cpus: Vec<usize>,
    /// Part counts (flat) and depths (recursive).
    pub parts: Vec<usize>,
    /// Trials per combination.
    pub runs: u32,
    /// Rows shown per round.
    pub top: usize,
    /// Strategies to time.
    pub strategies: Vec<Strategy>,
    /// Task scheduler.
    pub dispatch: Dispatch,
    /// Compare cancellation policy.
    pub cancellation: Cancellation,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            copy: false,
            compare: false,
            bufmin: 1024,
            bufmax: 4 << 20,
            bufsize: None,
            step: Step::Square,
            cpus: vec![default_cpus()],
            parts: vec![2, 4, 6],
            runs: 100,
            top: 10,
            strategies: Strategy::ALL.to_vec(),
            dispatch: Dispatch::default(),
            cancellation: Cancellation::default(),
        }
    }
}

impl AuditSettings {
    /// Selected operations, copy first.
    pub fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(2);
        if self.copy {
            ops.push(Operation::Copy);
        }
        if self.compare {
            ops.push(Operation::Compare);
        }
        ops
    }
}

fn default_cpus() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Rejected settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Neither copy nor compare selected.
    #[error("no operation selected (use --copy and/or --compare)")]
    NoOperation,
    /// `runs == 0`.
    #[error("--runs must be at least 1")]
    ZeroRuns,
    /// `top == 0`.
    #[error("--top must be at least 1")]
    ZeroTop,
    /// A zero in the cpu list.
    #[error("--cpu entries must be at least 1")]
    ZeroCpus,
    /// A zero in the parts list.
    #[error("--parts entries must be at least 1")]
    ZeroParts,
    /// Empty strategy filter.
    #[error("no strategies selected")]
    NoStrategies,
    /// `bufmin > bufmax`.
    #[error("bufmin ({min}) is larger than bufmax ({max})")]
    EmptySweep {
        /// Formatted lower bound.
        min: String,
        /// Formatted upper bound.
        max: String,
    },
    /// A sweep size beyond the address space.
    #[error("buffer size {0} bytes is too large for this platform")]
    SizeTooLarge(u64),
}

/// Validated settings, ready to run.
#[derive(Clone, Debug)]
pub struct AuditPlan {
    /// Operations, in run order.
    pub operations: Vec<Operation>,
    /// Buffer sizes, in run order.
    pub sizes: Vec<usize>,
    /// Worker-thread counts (pool dispatch only).
    pub cpus: Vec<usize>,
    /// Part counts / depths.
    pub params: Vec<usize>,
    /// Trials per combination.
    pub runs: u32,
    /// Rows shown per round.
    pub top: usize,
    /// Strategies to time, in the order given.
    pub strategies: Vec<Strategy>,
    /// Engine options for every concurrent call.
    pub options: EngineOptions,
    /// The sweep step after clamping.
    pub step: Step,
}

impl AuditPlan {
    /// Validates `settings`, logging every adjustment it makes.
    pub fn resolve(settings: &AuditSettings) -> Result<Self, PlanError> {
        let operations = settings.operations();
        if operations.is_empty() {
            return Err(PlanError::NoOperation);
        }
        if settings.runs == 0 {
            return Err(PlanError::ZeroRuns);
        }
        if settings.top == 0 {
            return Err(PlanError::ZeroTop);
        }
        let cpus = or_default(unique(&settings.cpus), default_cpus());
        if cpus.contains(&0) {
            return Err(PlanError::ZeroCpus);
        }
        let params = or_default(unique(&settings.parts), 2);
        if params.contains(&0) {
            return Err(PlanError::ZeroParts);
        }
        let strategies = unique(&settings.strategies);
        if strategies.is_empty() {
            return Err(PlanError::NoStrategies);
        }

        let (step, raised) = settings.step.with_minimum();
        if raised {
            warn!(
                requested = %settings.step,
                "additive step below {}, using {step}",
                format_size(MIN_ADD_STEP, 0)
            );
        }

        let (min, max) = settings
            .bufsize
            .map_or((settings.bufmin, settings.bufmax), |size| (size, size));
        if min > max {
            return Err(PlanError::EmptySweep {
                min: format_size(min, 2),
                max: format_size(max, 2),
            });
        }
        let sizes = step
            .sweep(min, max)
            .map(|size| usize::try_from(size).map_err(|_| PlanError::SizeTooLarge(size)))
            .collect::<Result<Vec<_>, _>>()?;

        let recursive = strategies.iter().any(|s| s.kind == StrategyKind::Recursive);
        if recursive && params.iter().any(|&p| p > MAX_DEPTH) {
            warn!("recursive depth is capped at {MAX_DEPTH}");
        }
        if settings.dispatch == Dispatch::Threads {
            info!("threads dispatch spawns one OS thread per task; --cpu is ignored");
        }

        Ok(Self {
            operations,
            sizes,
            cpus,
            params,
            runs: settings.runs,
            top: settings.top,
            strategies,
            options: EngineOptions {
                dispatch: settings.dispatch,
                cancellation: settings.cancellation,
            },
            step,
        })
    }

    /// `(operation, buffer size)` pairs in run order: all copy rounds first.
    pub fn rounds(&self) -> impl Iterator<Item = (Operation, usize)> + '_ {
        self.operations
            .iter()
            .flat_map(|&op| self.sizes.iter().map(move |&size| (op, size)))
    }

    /// The parameter actually passed to `strategy` for a requested `param`.
    pub fn effective_param(strategy: Strategy, param: usize) -> usize {
        match strategy.kind {
            StrategyKind::Recursive => param.min(MAX_DEPTH),
            _ => param,
        }
    }

    /// Worker-pool sizes trials run under; `None` means the dispatcher
    /// manages its own threads.
    pub fn pool_sizes(&self) -> Vec<Option<usize>> {
        match self.options.dispatch {
            Dispatch::Pool => self.cpus.iter().copied().map(Some).collect(),
            Dispatch::Threads => vec![None],
        }
    }
}

fn unique<T: PartialEq + Copy>(items: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for &item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn or_default(items: Vec<usize>, fallback: usize) -> Vec<usize> {
    if items.is_empty() {
        vec![fallback]
    } else {
        items
    }
}
