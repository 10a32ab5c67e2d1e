//! Project configuration (`preprint.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = "preprint.json";

/// Default compile command template.
pub const DEFAULT_COMMAND: &str = "latexmk -f -pdf -bibtex-cond {master}";
/// Default figure extension priority, highest first.
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "eps", "ps", "png", "jpg", "tif"];
/// Default master document.
pub const DEFAULT_MASTER: &str = "article.tex";

/// Project settings, stored as a flat JSON object.
///
/// Precedence is built-in defaults, then the configuration file, then
/// command-line flags. Unknown keys in the file are rejected so a typo
/// fails loudly instead of silently falling back to a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Compile command template; `{master}` is replaced by the master
    /// document path.
    #[serde(default = "default_command")]
    pub cmd: String,
    /// Figure extension priority, highest first.
    #[serde(default = "default_extensions")]
    pub exts: Vec<String>,
    /// Root document of the manuscript.
    #[serde(default = "default_master")]
    pub master: String,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_master() -> String {
    DEFAULT_MASTER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cmd: default_command(),
            exts: default_extensions(),
            master: default_master(),
        }
    }
}

impl Config {
    /// Load `preprint.json` from `dir`, falling back to the defaults
    /// when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            debug!("no {CONFIG_FILE}, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Write this configuration to `preprint.json` in `dir`, replacing
    /// any existing file. Returns the path written.
    pub fn store(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CONFIG_FILE);
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_file_absent() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.master, "article.tex");
        assert_eq!(config.exts[0], "pdf");
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"master": "paper/ms.tex"}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.master, "paper/ms.tex");
        assert_eq!(config.cmd, DEFAULT_COMMAND);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), r#"{"mastre": "ms.tex"}"#).unwrap();

        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();

        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_store_then_load_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = Config::default();
        config.master = "thesis.tex".to_string();
        config.exts = vec!["eps".to_string(), "pdf".to_string()];

        let path = config.store(dir.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE));
        assert_eq!(Config::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_store_writes_sorted_keys() {
        let dir = TempDir::new().expect("tempdir");
        Config::default().store(dir.path()).unwrap();

        let text = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let cmd_at = text.find("\"cmd\"").unwrap();
        let exts_at = text.find("\"exts\"").unwrap();
        let master_at = text.find("\"master\"").unwrap();
        assert!(cmd_at < exts_at && exts_at < master_at);
        assert!(text.ends_with('\n'));
    }
}
