//! rsync command construction.

use crate::config::Item;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Base rsync flags: recurse, keep symlinks, permissions, times and owner,
/// and delete destination files that are gone from the source or excluded.
pub const RSYNC_BASE: [&str; 3] = ["-rlpto", "--delete", "--delete-excluded"];

/// One rsync invocation. Built once per item and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    options: Vec<OsString>,
    exclude_files: Vec<PathBuf>,
    link_bases: Vec<PathBuf>,
    source: PathBuf,
    destination: PathBuf,
}

impl SyncCommand {
    /// Builds the command for `item` into today's snapshot `snapshot_dir`.
    ///
    /// `link_bases` must be ordered most recent first: rsync links against
    /// the first base holding an identical file.
    pub fn build(
        item: &Item,
        snapshot_dir: &Path,
        link_bases: &[PathBuf],
        global_excludes: &Path,
        verbose: bool,
    ) -> Self {
        let mut options: Vec<OsString> = RSYNC_BASE.iter().map(OsString::from).collect();
        if verbose {
            options.push("--verbose".into());
        }

        let mut exclude_files = vec![global_excludes.to_path_buf()];
        exclude_files.extend(item.excludes_path.iter().cloned());

        Self {
            options,
            exclude_files,
            link_bases: link_bases.to_vec(),
            source: item.source_dir.clone(),
            destination: snapshot_dir.to_path_buf(),
        }
    }

    /// Exclude files in the order they are passed.
    pub fn exclude_files(&self) -> &[PathBuf] {
        &self.exclude_files
    }

    /// Link bases in the order they are passed.
    pub fn link_bases(&self) -> &[PathBuf] {
        &self.link_bases
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Full argument list.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = self.options.clone();
        args.extend(
            self.exclude_files
                .iter()
                .map(|f| prefixed("--exclude-from=", f)),
        );
        args.extend(self.link_bases.iter().map(|d| prefixed("--link-dest=", d)));
        // Trailing slashes: copy the directory contents, not the directory.
        args.push(with_trailing_slash(&self.source));
        args.push(with_trailing_slash(&self.destination));
        args
    }
}

impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        write!(f, "{}", args.join(" "))
    }
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

fn with_trailing_slash(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    if !arg.to_string_lossy().ends_with('/') {
        arg.push(OsStr::new("/"));
    }
    arg
}
