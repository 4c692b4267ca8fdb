//! Query script loading and placeholder substitution.

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Placeholder token replaced with the resolved configuration path before a
/// script is injected into the editor.
pub const CONFIG_PATH_TOKEN: &str = "PATH_TO_CONFIG";

/// A query script payload, read once at run start and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryScript {
    text: String,
}

impl QueryScript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a script from disk.
    ///
    /// A missing or unreadable file degrades to the empty script: the run
    /// continues and fails downstream if the script mattered.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self { text },
            Err(err) => {
                warn!("could not read script {}: {err}", path.display());
                Self {
                    text: String::new(),
                }
            }
        }
    }

    /// Replace every [`CONFIG_PATH_TOKEN`] occurrence with `config_path`.
    /// A script without the token passes through unchanged; no other
    /// transformation or escaping is applied.
    pub fn with_config_path(self, config_path: &str) -> Self {
        Self {
            text: self.text.replace(CONFIG_PATH_TOKEN, config_path),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Resolve the configuration file against the current working directory.
/// Absolute paths pass through untouched.
pub fn resolve_config_path(config_file: &Path) -> PathBuf {
    if config_file.is_absolute() {
        return config_file.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(config_file),
        Err(err) => {
            warn!("could not resolve working directory: {err}");
            config_file.to_path_buf()
        }
    }
}
