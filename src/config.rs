//! Configuration file handling.
//!
//! Loading and saving of locksweep configuration from a TOML file.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/locksweep/config.toml`
//! - macOS: `~/Library/Application Support/locksweep/config.toml`
//! - Windows: `%APPDATA%\locksweep\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! out_dir = "./output"
//! quiet = false
//! ignore = ["**/fixtures/**", "vendor"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// Every field has a default, so a missing or partial config file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output directory when no `--out` flag is provided.
    ///
    /// Default: the current working directory.
    pub out_dir: Option<PathBuf>,

    /// Suppress terminal tables by default.
    pub quiet: bool,

    /// Ignore patterns applied during lockfile discovery, additive to the
    /// built-in exclusions and any `--ignore` flag. Supports `*` wildcards.
    pub ignore: Vec<String>,
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file, creating the parent
    /// directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("locksweep")
            .join("config.toml")
    }

    /// Renders the default configuration as TOML, for `config --init`.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Simple glob matching (supports * as wildcard).
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    // Check middle parts
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("vendor", "vendor"));
        assert!(!glob_match("vendor", "vendored"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("legacy-*", "legacy-app"));
        assert!(glob_match("legacy-*", "legacy-"));
        assert!(!glob_match("legacy-*", "modern-app"));
    }

    #[test]
    fn test_glob_match_suffix() {
        assert!(glob_match("*-fixtures", "test-fixtures"));
        assert!(!glob_match("*-fixtures", "fixtures-test"));
    }

    #[test]
    fn test_glob_match_contains() {
        assert!(glob_match("*fixtures*", "path/fixtures/package-lock.json"));
        assert!(!glob_match("*fixtures*", "path/src/package-lock.json"));
    }

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.out_dir.is_none());
        assert!(!config.quiet);
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn test_config_partial_toml() {
        let config: Config = toml::from_str(r#"ignore = ["vendor"]"#).unwrap();
        assert_eq!(config.ignore, ["vendor"]);
        assert!(!config.quiet);
    }
}
