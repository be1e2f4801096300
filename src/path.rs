use std::path::{Path, PathBuf};

/// Name of the per-user configuration directory, relative to `$HOME`.
pub const CONF_DIR_NAME: &str = ".increback";
/// Default configuration file name.
pub const CONF_FILE_NAME: &str = "conf.json";
/// Exclude file applied to every item.
pub const GLOBAL_EXCLUDES_NAME: &str = "global.excludes";

/// Returns the default configuration file, `$HOME/.increback/conf.json`.
///
/// Falls back to a relative path when the home directory cannot be resolved.
pub fn default_config_file() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    home.join(CONF_DIR_NAME).join(CONF_FILE_NAME)
}

/// Returns the directory holding the exclude files for `config_file`.
pub fn config_dir_of(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Expands a path, replacing a leading `~` or `$HOME` with the user's home directory.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(expand_home(path))
}

fn expand_home(input: &str) -> String {
    if input.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return input.replacen('~', &home.to_string_lossy(), 1);
        }
    } else if input.starts_with("$HOME") {
        if let Some(home) = dirs::home_dir() {
            return input.replacen("$HOME", &home.to_string_lossy(), 1);
        }
    }
    input.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/data"), home.join("data"));
        assert_eq!(expand_path("$HOME/data"), home.join("data"));
        assert_eq!(expand_path("/srv/data"), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_config_dir_of() {
        assert_eq!(
            config_dir_of(Path::new("/etc/increback/conf.json")),
            PathBuf::from("/etc/increback")
        );
        assert_eq!(config_dir_of(Path::new("conf.json")), PathBuf::from("."));
    }

    #[test]
    fn test_default_config_file() {
        let file = dirs::home_dir()
            .unwrap()
            .join(".increback")
            .join("conf.json");
        assert_eq!(default_config_file(), file);
    }
}
