//! Command-line interface definition for increback.

use crate::config::DEFAULT_NLINK;
use clap::Parser;
use std::path::PathBuf;

/// Command-line interface definition for increback.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file. Default: $HOME/.increback/conf.json
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level by 1.
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Dry run: do nothing, just tell what would be done.
    #[arg(short = 'y', long)]
    pub dry_run: bool,

    /// How many previous backups (at most) to use for linking, for items without `nlink`.
    #[arg(long, default_value_t = DEFAULT_NLINK, allow_negative_numbers = true)]
    pub nlink: i64,

    /// Do not use color output in console.
    #[arg(long)]
    pub no_colors: bool,

    /// Synchronization program to run.
    #[arg(long, value_name = "PROGRAM", default_value = "rsync")]
    pub rsync: String,
}

impl Cli {
    /// Whether commands should be logged and rsync run verbosely.
    pub fn verbose(&self) -> bool {
        self.verbosity > 0
    }
}
