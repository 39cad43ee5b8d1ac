// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bufcpy auditor
//!
//! Sweeps buffer sizes and, for each size, times the direct routines and
//! every concurrent strategy across worker-pool sizes and part counts, then
//! ranks them against the native baseline. Reports go to stdout, logs to
//! stderr.

mod cli;
mod debug_server;
mod plan;
mod profile;
mod progress;
mod report;
mod runner;
mod size;
mod step;

use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::plan::{AuditPlan, AuditSettings};
use crate::profile::{ConfigService, FsConfigStore};
use crate::progress::Progress;
use crate::runner::Runner;
use crate::size::format_size;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let settings = resolve_settings(&args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if settings.operations().is_empty() {
        if args.save_profile.is_none() {
            write!(out, "{}", Args::command().render_help())?;
        }
        return Ok(());
    }

    let plan = AuditPlan::resolve(&settings)?;
    let progress = Progress::default();
    let server = if args.debug {
        Some(debug_server::spawn(args.debug_addr, progress.clone())?)
    } else {
        None
    };
    if !args.json {
        write_banner(&mut out, &plan)?;
        if let Some(server) = &server {
            writeln!(out, "debug status: http://{}/debug/status", server.local_addr())?;
        }
        writeln!(out)?;
    }

    let runner = Runner::new(&plan, progress).context("preparing worker pools")?;
    for (operation, bufsize) in plan.rounds() {
        let report = runner.run_round(operation, bufsize)?;
        if args.json {
            serde_json::to_writer(&mut out, &report.summary())?;
            writeln!(out)?;
        } else {
            report.write_text(&mut out)?;
        }
        out.flush()?;
    }
    info!("audit finished");
    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::WARN,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    // stdout carries the report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("setting default subscriber failed")
}

/// Defaults, then the named profile, then command-line flags. Saves the
/// result when `--save-profile` is given.
fn resolve_settings(args: &Args) -> Result<AuditSettings> {
    if args.profile.is_none() && args.save_profile.is_none() {
        return Ok(args.apply(AuditSettings::default()));
    }
    let service = ConfigService::new(FsConfigStore::new().context("resolving profile directory")?);
    let base = match &args.profile {
        Some(name) => service
            .load(name)
            .with_context(|| format!("loading profile `{name}`"))?
            .ok_or_else(|| anyhow!("no saved profile named `{name}`"))?,
        None => AuditSettings::default(),
    };
    let settings = args.apply(base);
    if let Some(name) = &args.save_profile {
        service
            .save(name, &settings)
            .with_context(|| format!("saving profile `{name}`"))?;
        info!(profile = %name, "settings saved");
    }
    Ok(settings)
}

fn write_banner(out: &mut impl Write, plan: &AuditPlan) -> io::Result<()> {
    let join = |items: Vec<String>| items.join(", ");
    writeln!(out, "==============")?;
    writeln!(out, "Bufcpy Auditor")?;
    writeln!(out, "==============")?;
    writeln!(
        out,
        "operations: {}",
        join(plan.operations.iter().map(ToString::to_string).collect())
    )?;
    writeln!(
        out,
        "sizes: {} (step {})",
        join(plan.sizes.iter().map(|&s| format_size(s as u64, 2)).collect()),
        plan.step
    )?;
    writeln!(
        out,
        "cpus: {} | parts/depth: {} | runs: {} | top: {}",
        join(plan.cpus.iter().map(ToString::to_string).collect()),
        join(plan.params.iter().map(ToString::to_string).collect()),
        plan.runs,
        plan.top
    )?;
    writeln!(
        out,
        "dispatch: {} | cancel: {}",
        plan.options.dispatch, plan.options.cancellation
    )?;
    writeln!(
        out,
        "strategies: {}",
        join(plan.strategies.iter().map(ToString::to_string).collect())
    )
}
