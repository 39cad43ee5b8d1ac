// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface.

use std::net::SocketAddr;

use bufcpy_core::{Cancellation, Dispatch, Strategy};
use clap::{ArgAction, Parser};

use crate::plan::AuditSettings;
use crate::size::parse_size;
use crate::step::Step;

const EXAMPLE: &str = "\
Example:
  bufcpy-auditor --copy --compare --bufmin 1kb --bufmax 64mb --step '*4' --cpu 1,2,4 --parts 2,4,8";

/// Sweep buffer sizes and rank parallel copy/compare strategies.
///
/// Settings left unset come from `--profile` when given, otherwise from the
/// defaults shown below.
#[derive(Parser, Debug)]
#[command(name = "bufcpy-auditor", version, about, after_help = EXAMPLE)]
pub struct Args {
    /// Run the copy benchmarks.
    #[arg(long)]
    pub copy: bool,

    /// Run the compare benchmarks.
    #[arg(long)]
    pub compare: bool,

    /// Smallest buffer size in the sweep [default: 1kb].
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub bufmin: Option<u64>,

    /// Largest buffer size in the sweep [default: 4mb].
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub bufmax: Option<u64>,

    /// Benchmark a single buffer size instead of bufmin..bufmax.
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub bufsize: Option<u64>,

    /// Sweep step: ^ (square), +SIZE (add, at least 32kb) or *N [default: ^].
    #[arg(long, value_name = "STEP", allow_hyphen_values = true)]
    pub step: Option<Step>,

    /// Worker-thread counts, comma separated [default: available parallelism].
    #[arg(long, value_name = "N,...", value_delimiter = ',')]
    pub cpu: Vec<usize>,

    /// Part counts (flat) and depths (recursive), comma separated [default: 2,4,6].
    #[arg(long, value_name = "N,...", value_delimiter = ',')]
    pub parts: Vec<usize>,

    /// Trials per combination [default: 100].
    #[arg(long)]
    pub runs: Option<u32>,

    /// Rows shown per round [default: 10].
    #[arg(long)]
    pub top: Option<usize>,

    /// Strategies to time, e.g. `recursive/foreign,partitioned` [default: all].
    #[arg(long = "strategy", value_name = "KIND[/PRIMITIVE],...", value_delimiter = ',')]
    pub strategies: Vec<Strategy>,

    /// Task scheduler: `pool` (sized worker pools) or `threads` [default: pool].
    #[arg(long)]
    pub dispatch: Option<Dispatch>,

    /// Compare cancellation: `none` or `eager` [default: none].
    #[arg(long = "cancel", value_name = "MODE")]
    pub cancellation: Option<Cancellation>,

    /// Print one JSON object per round instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Serve progress over HTTP while benchmarking.
    #[arg(long)]
    pub debug: bool,

    /// Address of the debug server.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    pub debug_addr: SocketAddr,

    /// Start from a saved profile.
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Save the resolved settings under NAME.
    #[arg(long, value_name = "NAME")]
    pub save_profile: Option<String>,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors on stderr.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Layers the flags given on the command line over `base`.
    pub fn apply(&self, base: AuditSettings) -> AuditSettings {
        let mut settings = base;
        settings.copy |= self.copy;
        settings.compare |= self.compare;
        if self.bufmin.is_some() || self.bufmax.is_some() {
            settings.bufsize = None;
        }
        if let Some(bufmin) = self.bufmin {
            settings.bufmin = bufmin;
        }
        if let Some(bufmax) = self.bufmax {
            settings.bufmax = bufmax;
        }
        if self.bufsize.is_some() {
            settings.bufsize = self.bufsize;
        }
        if let Some(step) = self.step {
            settings.step = step;
        }
        if !self.cpu.is_empty() {
            settings.cpus.clone_from(&self.cpu);
        }
        if !self.parts.is_empty() {
            settings.parts.clone_from(&self.parts);
        }
        if let Some(runs) = self.runs {
            settings.runs = runs;
        }
        if let Some(top) = self.top {
            settings.top = top;
        }
        if !self.strategies.is_empty() {
            settings.strategies.clone_from(&self.strategies);
        }
        if let Some(dispatch) = self.dispatch {
            settings.dispatch = dispatch;
        }
        if let Some(cancellation) = self.cancellation {
            settings.cancellation = cancellation;
        }
        settings
    }
}
