//! increback: incremental backups with rsync and hardlinked dated snapshots.
//!
//! This crate provides the configuration model, snapshot selection, rsync
//! command construction and the per-item run controller used by the
//! `increback` binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod path;
pub mod runner;
pub mod snapshot;
pub mod sync;
pub mod sysexits;

pub use error::{Error, Result};
