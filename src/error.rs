//! Error types for increback.

use crate::sysexits;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors of a backup run. All but `ExternalTool` stop the run.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("Could not load config file [ {} ]: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    /// The configuration file is not valid JSON or has the wrong shape.
    #[error("Could not parse config file [ {} ]: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A requested item is not defined in the configuration.
    #[error("Item [{0}] is not defined in the configuration")]
    UnknownItem(String),

    /// A required item field is missing.
    #[error("Item [{item}] is missing required field '{field}'")]
    MissingField { item: String, field: &'static str },

    /// The destination root of an item is not an existing directory.
    #[error("Destination dir {} for item [{item}] not present!", path.display())]
    DestinationUnavailable { item: String, path: PathBuf },

    /// Listing the snapshots of a destination failed.
    #[error("Could not list snapshots of item [{item}] in {}: {source}", path.display())]
    Scan {
        item: String,
        path: PathBuf,
        source: walkdir::Error,
    },

    /// The synchronization program could not be launched for an item.
    #[error("Could not launch '{program}' for item [{item}]: {source}")]
    ExternalTool {
        item: String,
        program: String,
        source: io::Error,
    },
}

impl Error {
    /// Returns true for the configuration-error family.
    #[cfg(test)]
    pub(crate) fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigRead { .. }
                | Error::ConfigParse { .. }
                | Error::UnknownItem(_)
                | Error::MissingField { .. }
        )
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ConfigRead { .. } => sysexits::EX_NOINPUT,
            Error::ConfigParse { .. } | Error::UnknownItem(_) | Error::MissingField { .. } => {
                sysexits::EX_CONFIG
            }
            Error::DestinationUnavailable { .. } => sysexits::EX_UNAVAILABLE,
            Error::Scan { .. } => sysexits::EX_IOERR,
            Error::ExternalTool { .. } => sysexits::EX_OSERR,
        }
    }
}

/// Result type for increback operations.
pub type Result<T> = std::result::Result<T, Error>;
