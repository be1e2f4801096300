//! Dated snapshot directories.
//!
//! Every backup of an item lands in `dest_root/YYYY.MM.DD`. Older snapshots
//! are reused as rsync `--link-dest` bases so that unchanged files become
//! hardlinks instead of copies.

use crate::config::{Item, MAX_LINK_DIRS};
use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// `chrono` format of a snapshot directory name.
pub const SNAPSHOT_FORMAT: &str = "%Y.%m.%d";

/// Shape of a snapshot directory name. The calendar date itself is not validated.
///
/// ASCII digits only, so that names sort by date.
static SNAPSHOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}\.[0-9]{2}\.[0-9]{2}$").expect("valid snapshot pattern")
});

/// Returns the snapshot directory name for `date`.
pub fn snapshot_name(date: NaiveDate) -> String {
    date.format(SNAPSHOT_FORMAT).to_string()
}

/// Returns the snapshot name for `day` shifted by `offset` days.
///
/// Returns `None` when the shifted date is out of range.
pub fn timestamp(day: NaiveDate, offset: i64) -> Option<String> {
    let shifted = if offset >= 0 {
        day.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        day.checked_sub_days(Days::new(offset.unsigned_abs()))
    }?;
    Some(snapshot_name(shifted))
}

/// Whether `name` looks like a snapshot directory name.
pub fn is_snapshot_name(name: &str) -> bool {
    SNAPSHOT_NAME.is_match(name)
}

/// Lists snapshot directories directly under `dest_root`, most recent first.
///
/// The names are fixed width and zero padded, so sorting them as strings
/// sorts them chronologically. Changing the name format breaks this.
pub fn list_snapshots(dest_root: &Path) -> walkdir::Result<Vec<PathBuf>> {
    let mut names = vec![];
    for entry in WalkDir::new(dest_root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if is_snapshot_name(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names.into_iter().map(|n| dest_root.join(n)).collect())
}

/// Whether today's snapshot of `item` already exists.
pub fn is_backup_done_today(item: &Item, today: &str) -> bool {
    item.snapshot_dir(today).is_dir()
}

/// Selects link bases per item, memoized for the duration of a run.
#[derive(Debug, Default)]
pub struct SnapshotScanner {
    cache: HashMap<String, Vec<PathBuf>>,
}

impl SnapshotScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns at most `min(20, item.max_link_dirs)` previous snapshots of
    /// `item`, most recent first.
    ///
    /// `item.dest_root` must exist; the caller checks it beforehand.
    pub fn list_link_bases(&mut self, item: &Item) -> Result<&[PathBuf]> {
        if !self.cache.contains_key(&item.name) {
            let cap = item.max_link_dirs.min(MAX_LINK_DIRS);
            let mut bases = list_snapshots(&item.dest_root).map_err(|source| Error::Scan {
                item: item.name.clone(),
                path: item.dest_root.clone(),
                source,
            })?;
            bases.truncate(cap);
            debug!("Found {} link base(s) for [{}]", bases.len(), item.name);
            self.cache.insert(item.name.clone(), bases);
        }
        Ok(self.cache.get(&item.name).map(Vec::as_slice).unwrap_or(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn item(dest_root: &Path, max_link_dirs: usize) -> Item {
        Item {
            name: "home".to_string(),
            source_dir: PathBuf::from("/home/me"),
            dest_root: dest_root.to_path_buf(),
            active: true,
            max_link_dirs,
            excludes_path: None,
        }
    }

    fn make_dirs(root: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir(root.join(name)).unwrap();
        }
    }

    #[test]
    fn test_snapshot_name() {
        let day = NaiveDate::from_ymd_opt(1977, 6, 11).unwrap();
        assert_eq!(snapshot_name(day), "1977.06.11");
        assert!(is_snapshot_name(&snapshot_name(day)));
    }

    #[test]
    fn test_timestamp_with_offset() {
        let cases = [
            ((1977, 6, 11), 0, "1977.06.11"),
            ((1977, 6, 11), 1, "1977.06.12"),
            ((1977, 6, 11), 75, "1977.08.25"),
            ((2017, 1, 1), 0, "2017.01.01"),
            ((2017, 1, 1), -1, "2016.12.31"),
            ((2017, 1, 1), -100, "2016.09.23"),
        ];
        for ((y, m, d), offset, expected) in cases {
            let day = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            assert_eq!(timestamp(day, offset).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_is_snapshot_name() {
        assert!(is_snapshot_name("2024.01.10"));
        assert!(is_snapshot_name("2024.99.99"));
        assert!(!is_snapshot_name("2024-01-10"));
        assert!(!is_snapshot_name("2024.01.10.old"));
        assert!(!is_snapshot_name("x2024.01.10"));
        assert!(!is_snapshot_name("24.01.10"));
        assert!(!is_snapshot_name("٢٠٢٤.٠١.٠١"));
        assert!(!is_snapshot_name("２０２４.０１.１０"));
    }

    #[test]
    fn test_link_bases_most_recent_first() {
        let temp = TempDir::new().unwrap();
        make_dirs(temp.path(), &["2024.01.08", "2024.01.10", "2024.01.09"]);

        let mut scanner = SnapshotScanner::new();
        let bases = scanner.list_link_bases(&item(temp.path(), 2)).unwrap();
        assert_eq!(
            bases,
            [temp.path().join("2024.01.10"), temp.path().join("2024.01.09")]
        );
    }

    #[test]
    fn test_link_bases_ignore_other_entries() {
        let temp = TempDir::new().unwrap();
        make_dirs(temp.path(), &["2023.12.31", "lost+found", "2024.01.01-partial"]);
        fs::write(temp.path().join("2024.02.02"), b"not a dir").unwrap();

        let mut scanner = SnapshotScanner::new();
        let bases = scanner.list_link_bases(&item(temp.path(), 10)).unwrap();
        assert_eq!(bases, [temp.path().join("2023.12.31")]);
    }

    #[test]
    fn test_link_bases_skip_non_ascii_digits() {
        let temp = TempDir::new().unwrap();
        make_dirs(temp.path(), &["2024.01.10", "٢٠٢٤.٠١.٠١", "2024.01.09"]);

        let mut scanner = SnapshotScanner::new();
        let bases = scanner.list_link_bases(&item(temp.path(), 1)).unwrap();
        assert_eq!(bases, [temp.path().join("2024.01.10")]);
    }

    #[test]
    fn test_link_bases_zero_cap() {
        let temp = TempDir::new().unwrap();
        make_dirs(temp.path(), &["2024.01.08", "2024.01.09"]);

        let mut scanner = SnapshotScanner::new();
        assert!(scanner.list_link_bases(&item(temp.path(), 0)).unwrap().is_empty());
    }

    #[test]
    fn test_link_bases_never_exceed_hard_cap() {
        let temp = TempDir::new().unwrap();
        let names: Vec<String> = (1..=25).map(|d| format!("2024.01.{d:02}")).collect();
        for name in &names {
            fs::create_dir(temp.path().join(name)).unwrap();
        }

        let mut scanner = SnapshotScanner::new();
        let bases = scanner.list_link_bases(&item(temp.path(), 99)).unwrap();
        assert_eq!(bases.len(), MAX_LINK_DIRS);
        assert_eq!(bases[0], temp.path().join("2024.01.25"));
        assert!(bases.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_link_bases_are_memoized() {
        let temp = TempDir::new().unwrap();
        make_dirs(temp.path(), &["2024.01.08"]);
        let item = item(temp.path(), 5);

        let mut scanner = SnapshotScanner::new();
        let first = scanner.list_link_bases(&item).unwrap().to_vec();
        let second = scanner.list_link_bases(&item).unwrap().to_vec();
        assert_eq!(first, second);

        // The cached result is kept for the rest of the run.
        make_dirs(temp.path(), &["2024.01.09"]);
        assert_eq!(scanner.list_link_bases(&item).unwrap(), first.as_slice());
    }

    #[test]
    fn test_empty_destination() {
        let temp = TempDir::new().unwrap();
        let mut scanner = SnapshotScanner::new();
        assert!(scanner.list_link_bases(&item(temp.path(), 5)).unwrap().is_empty());
    }

    #[test]
    fn test_missing_destination_is_scan_error() {
        let temp = TempDir::new().unwrap();
        let mut scanner = SnapshotScanner::new();
        let err = scanner
            .list_link_bases(&item(&temp.path().join("gone"), 5))
            .unwrap_err();
        assert!(matches!(err, Error::Scan { ref item, .. } if item == "home"));
    }

    #[test]
    fn test_backup_done_today() {
        let temp = TempDir::new().unwrap();
        make_dirs(temp.path(), &["2024.01.10"]);
        let item = item(temp.path(), 5);
        assert!(is_backup_done_today(&item, "2024.01.10"));
        assert!(!is_backup_done_today(&item, "2024.01.11"));
    }
}
