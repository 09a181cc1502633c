//! Configuration types and parsing for scribe
//!
//! Settings live in an optional YAML file, by default
//! `~/.config/scribe/config.yaml`. Every key is optional.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ScribeError, ScribeResult},
    tmux::Tmux,
};

// =============================================================================
// Path Constants
// =============================================================================

const CONFIG_DIR: &str = ".config";
const SCRIBE_DIR: &str = "scribe";
const CONFIG_FILE: &str = "config.yaml";

// =============================================================================
// Configuration Types
// =============================================================================

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScribeConfig {
    pub tmux: TmuxConfig,
}

/// How to reach tmux
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TmuxConfig {
    /// Binary to run (name on PATH or absolute path)
    pub binary: String,
    /// Give up on a single tmux call after this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: "tmux".to_string(),
            timeout_secs: None,
        }
    }
}

impl ScribeConfig {
    /// Process client built from these settings
    pub fn tmux(&self) -> Tmux {
        Tmux::new(expand_path(&self.tmux.binary))
            .timeout(self.tmux.timeout_secs.map(Duration::from_secs))
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Location of the default configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(SCRIBE_DIR).join(CONFIG_FILE))
}

/// Load configuration from an explicit file; it must exist and parse
pub fn load_config(path: &Path) -> ScribeResult<ScribeConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ScribeError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Ok(ScribeConfig::default());
    }
    serde_yaml::from_str(&content)
        .map_err(|e| ScribeError::Config(format!("{}: {}", path.display(), e)))
}

/// Load the default configuration file, falling back to defaults when absent
pub fn load_default_config() -> ScribeResult<ScribeConfig> {
    match default_config_path() {
        Some(path) if path.exists() => load_config(&path),
        _ => Ok(ScribeConfig::default()),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Expand ~ to home directory in paths
pub fn expand_path(path: &str) -> String {
    path.strip_prefix("~/")
        .and_then(|stripped| dirs::home_dir().map(|home| home.join(stripped)))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_full_config() {
        let file = write_config("tmux:\n  binary: /opt/tmux/bin/tmux\n  timeout_secs: 5\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.tmux.binary, "/opt/tmux/bin/tmux");
        assert_eq!(config.tmux.timeout_secs, Some(5));
        assert_eq!(config.tmux().binary(), "/opt/tmux/bin/tmux");
    }

    #[test]
    fn test_partial_and_empty_config() {
        let file = write_config("tmux:\n  timeout_secs: 2\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.tmux.binary, "tmux");

        let empty = write_config("");
        assert_eq!(load_config(empty.path()).unwrap(), ScribeConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("tmux:\n  binary: [not, a, string]\n");
        assert!(matches!(load_config(file.path()), Err(ScribeError::Config(_))));

        let unknown = write_config("tmux:\n  colour: red\n");
        assert!(matches!(load_config(unknown.path()), Err(ScribeError::Config(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/usr/bin/tmux"), "/usr/bin/tmux");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_path("~/bin/tmux"),
                home.join("bin/tmux").to_string_lossy()
            );
        }
    }
}
