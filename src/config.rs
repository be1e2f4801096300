//! Backup configuration.
//!
//! The configuration is a JSON file mapping item names to their source and
//! destination directories. It is loaded once at startup into an immutable
//! [`Config`] and every later component only reads from it.

use crate::error::{Error, Result};
use crate::path::{self, GLOBAL_EXCLUDES_NAME};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Hard ceiling on the number of previous snapshots used as link bases.
pub const MAX_LINK_DIRS: usize = 20;
/// Link-base cap for items that do not set `nlink`.
pub const DEFAULT_NLINK: i64 = 10;

/// On-disk shape of the configuration file.
#[derive(Deserialize, Debug)]
struct ConfigFile {
    items: Map<String, Value>,
    #[serde(default)]
    colorize: bool,
}

/// On-disk shape of a single item.
#[derive(Deserialize, Debug, Clone, Default)]
struct ItemConfig {
    fromdir: Option<String>,
    todir: Option<String>,
    #[serde(default)]
    active: bool,
    nlink: Option<i64>,
}

/// A named backup unit, resolved from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Unique item name.
    pub name: String,
    /// Directory whose contents are backed up.
    pub source_dir: PathBuf,
    /// Directory under which the dated snapshots live.
    pub dest_root: PathBuf,
    /// Inactive items are never processed.
    pub active: bool,
    /// How many previous snapshots may serve as link bases, within `0..=20`.
    pub max_link_dirs: usize,
    /// Item specific exclude file, only when it exists on disk.
    pub excludes_path: Option<PathBuf>,
}

impl Item {
    /// Snapshot directory for the day named `date_name`.
    pub fn snapshot_dir(&self, date_name: &str) -> PathBuf {
        self.dest_root.join(date_name)
    }
}

/// Immutable view over the loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    conf_dir: PathBuf,
    items: Vec<(String, ItemConfig)>,
    colorize: bool,
    default_nlink: i64,
}

impl Config {
    /// Reads and parses the configuration file at `file`.
    ///
    /// Exclude files are looked up next to it.
    pub fn load(file: &Path) -> Result<Self> {
        let json = fs::read_to_string(file).map_err(|source| Error::ConfigRead {
            path: file.to_path_buf(),
            source,
        })?;
        Self::parse(&json, file)
    }

    /// Parses configuration JSON that was read from `file`.
    pub fn parse(json: &str, file: &Path) -> Result<Self> {
        let parse_err = |source: serde_json::Error| Error::ConfigParse {
            path: file.to_path_buf(),
            source,
        };
        let raw: ConfigFile = serde_json::from_str(json).map_err(parse_err)?;
        let items = raw
            .items
            .into_iter()
            .map(|(name, value)| {
                let item: ItemConfig = serde_json::from_value(value).map_err(parse_err)?;
                Ok((name, item))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            conf_dir: path::config_dir_of(file),
            items,
            colorize: raw.colorize,
            default_nlink: DEFAULT_NLINK,
        })
    }

    /// Sets the link-base cap used by items without an `nlink` field.
    pub fn with_default_nlink(mut self, nlink: i64) -> Self {
        self.default_nlink = nlink;
        self
    }

    /// Directory holding the configuration file and the exclude files.
    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    /// Whether console output should be colored.
    pub fn colorize(&self) -> bool {
        self.colorize
    }

    /// Names of the active items, in configuration order.
    pub fn active_items(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|(_, item)| item.active)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Source directory of item `name`.
    pub fn source_dir(&self, name: &str) -> Result<PathBuf> {
        let fromdir = self.raw_item(name)?.fromdir.as_deref();
        required(name, "fromdir", fromdir)
    }

    /// Destination root of item `name`.
    pub fn dest_root(&self, name: &str) -> Result<PathBuf> {
        let todir = self.raw_item(name)?.todir.as_deref();
        required(name, "todir", todir)
    }

    /// Link-base cap of item `name`, clamped to `0..=MAX_LINK_DIRS`.
    pub fn max_link_dirs(&self, name: &str) -> Result<usize> {
        let nlink = self.raw_item(name)?.nlink.unwrap_or(self.default_nlink);
        Ok(clamp_link_dirs(nlink))
    }

    /// Exclude file for item `name`, if it exists.
    pub fn excludes_path(&self, name: &str) -> Result<Option<PathBuf>> {
        self.raw_item(name)?;
        let file = self.conf_dir.join(format!("{name}.excludes"));
        Ok(file.is_file().then_some(file))
    }

    /// Exclude file applied to all items. It is referenced even if missing.
    pub fn global_excludes(&self) -> PathBuf {
        self.conf_dir.join(GLOBAL_EXCLUDES_NAME)
    }

    /// Resolves item `name` with all of its fields.
    pub fn item(&self, name: &str) -> Result<Item> {
        Ok(Item {
            name: name.to_string(),
            source_dir: self.source_dir(name)?,
            dest_root: self.dest_root(name)?,
            active: self.raw_item(name)?.active,
            max_link_dirs: self.max_link_dirs(name)?,
            excludes_path: self.excludes_path(name)?,
        })
    }

    /// Resolves every active item, failing on the first misconfigured one.
    pub fn active_item_list(&self) -> Result<Vec<Item>> {
        self.active_items()
            .into_iter()
            .map(|name| self.item(name))
            .collect()
    }

    fn raw_item(&self, name: &str) -> Result<&ItemConfig> {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, item)| item)
            .ok_or_else(|| Error::UnknownItem(name.to_string()))
    }
}

fn required(item: &str, field: &'static str, value: Option<&str>) -> Result<PathBuf> {
    match value {
        Some(v) if !v.is_empty() => Ok(path::expand_path(v)),
        _ => Err(Error::MissingField {
            item: item.to_string(),
            field,
        }),
    }
}

/// Clamps a configured link-base count to `0..=MAX_LINK_DIRS`.
pub fn clamp_link_dirs(nlink: i64) -> usize {
    nlink.clamp(0, MAX_LINK_DIRS as i64) as usize
}
