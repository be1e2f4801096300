//! Per-item backup run.
//!
//! Each active item goes through the same steps, one item at a time:
//! check that the destination is mounted, skip it if today's snapshot
//! already exists, otherwise select link bases, build the rsync command and
//! either print it (dry run) or execute it and wait for it to finish.

use crate::config::{Config, Item};
use crate::error::{Error, Result};
use crate::snapshot::{self, SnapshotScanner};
use crate::sync::SyncCommand;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};
use tracing::{debug, error, info, warn};

/// Launches the synchronization program.
pub trait Executor {
    /// Runs `program` with the arguments of `command` and waits for it to exit.
    fn execute(&mut self, program: &str, command: &SyncCommand) -> io::Result<ExitStatus>;
}

/// Runs the program as a child process sharing our stdio.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&mut self, program: &str, command: &SyncCommand) -> io::Result<ExitStatus> {
        Command::new(program).args(command.args()).status()
    }
}

/// Options that apply to the whole run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Print commands instead of executing them.
    pub dry_run: bool,
    /// Log every command and ask rsync to be verbose.
    pub verbose: bool,
    /// Synchronization program to invoke.
    pub program: String,
    /// Name of today's snapshot, `YYYY.MM.DD`.
    pub today: String,
}

/// What happened to one item.
#[derive(Debug)]
pub enum Outcome {
    /// The item is not active.
    Inactive,
    /// Today's snapshot already existed.
    Skipped,
    /// The command that would have run.
    DryRun(SyncCommand),
    /// The command ran to completion. Its exit status is not interpreted.
    Executed {
        command: SyncCommand,
        status: ExitStatus,
    },
    /// The program could not be launched. The run goes on with the next item.
    Failed { command: SyncCommand, error: Error },
}

/// Per-outcome counts of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub synced: usize,
    pub dry_run: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn new(outcomes: &[(String, Outcome)]) -> Self {
        let mut summary = Self::default();
        for (_, outcome) in outcomes {
            match outcome {
                Outcome::Executed { .. } => summary.synced += 1,
                Outcome::DryRun(_) => summary.dry_run += 1,
                Outcome::Inactive | Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.synced + self.dry_run + self.skipped + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} item(s): {} synced, {} dry run, {} skipped, {} failed",
            self.total(),
            self.synced,
            self.dry_run,
            self.skipped,
            self.failed
        )
    }
}

/// Drives the backup of every active item.
pub struct Runner<'a, E> {
    config: &'a Config,
    options: RunOptions,
    scanner: SnapshotScanner,
    executor: E,
}

impl<'a, E: Executor> Runner<'a, E> {
    pub fn new(config: &'a Config, options: RunOptions, executor: E) -> Self {
        Self {
            config,
            options,
            scanner: SnapshotScanner::new(),
            executor,
        }
    }

    /// Backs up all active items in configuration order.
    ///
    /// Every active item is resolved first, so a configuration error stops
    /// the run before anything is done. An unmounted destination stops the
    /// whole run.
    pub fn run(&mut self) -> Result<Vec<(String, Outcome)>> {
        let items = self.config.active_item_list()?;
        let global_excludes = self.config.global_excludes();
        if !global_excludes.is_file() {
            warn!(
                "Global excludes file {} does not exist",
                global_excludes.display()
            );
        }

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let outcome = self.run_item(&item, &global_excludes)?;
            outcomes.push((item.name, outcome));
        }
        Ok(outcomes)
    }

    /// Backs up a single item.
    pub fn run_item(&mut self, item: &Item, global_excludes: &Path) -> Result<Outcome> {
        if !item.active {
            info!("Item [{}] is not active. Skipping...", item.name);
            return Ok(Outcome::Inactive);
        }

        check_dest_dir_mounted(item)?;

        if snapshot::is_backup_done_today(item, &self.options.today) {
            info!("Item [{}] already backed up. Skipping...", item.name);
            return Ok(Outcome::Skipped);
        }

        info!("Determining last linkable dirs for [{}]:", item.name);
        let link_bases = self.scanner.list_link_bases(item)?;
        for dir in link_bases {
            info!("{}", dir.display());
        }

        let command = SyncCommand::build(
            item,
            &item.snapshot_dir(&self.options.today),
            link_bases,
            global_excludes,
            self.options.verbose,
        );

        if self.options.dry_run {
            info!("Actual backup would go here...");
            println!("{} {command}", self.options.program);
            return Ok(Outcome::DryRun(command));
        }

        info!("Doing actual backup of [{}]...", item.name);
        if self.options.verbose {
            info!("{} {command}", self.options.program);
        } else {
            debug!("{} {command}", self.options.program);
        }
        match self.executor.execute(&self.options.program, &command) {
            Ok(status) => {
                info!("{} finished for [{}]: {status}", self.options.program, item.name);
                Ok(Outcome::Executed { command, status })
            }
            Err(source) => {
                let err = Error::ExternalTool {
                    item: item.name.clone(),
                    program: self.options.program.clone(),
                    source,
                };
                error!("{err}");
                Ok(Outcome::Failed {
                    command,
                    error: err,
                })
            }
        }
    }

    #[cfg(test)]
    fn executor(&self) -> &E {
        &self.executor
    }
}

/// Fails unless the destination root of `item` is an existing directory.
pub fn check_dest_dir_mounted(item: &Item) -> Result<()> {
    if item.dest_root.is_dir() {
        Ok(())
    } else {
        Err(Error::DestinationUnavailable {
            item: item.name.clone(),
            path: item.dest_root.clone(),
        })
    }
}
