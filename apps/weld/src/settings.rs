//! # Settings
//!
//! `weld.toml` holds the export configuration keys at the top level and an
//! optional `[compiler]` table:
//!
//! ```toml
//! bean_package = "acme/beans"
//! keep_sources = true
//!
//! [compiler]
//! program = "javac"
//! args = ["-g"]
//! ```
//!
//! `WELD_KEEP_SOURCES` overrides `keep_sources` (`1`, `true` or `yes` keep,
//! anything else discards).

use serde::Deserialize;
use std::path::Path;
use weld_core::{ExportConfig, WeldError};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_SETTINGS_FILE: &str = "weld.toml";

/// Environment override of `keep_sources`.
pub const KEEP_SOURCES_ENV: &str = "WELD_KEEP_SOURCES";

/// External compiler invoked on generated sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerSettings {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub export: ExportConfig,
    #[serde(default)]
    pub compiler: Option<CompilerSettings>,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, WeldError> {
        toml::from_str(text).map_err(|e| WeldError::Config(e.to_string()))
    }

    /// Load `path`, or `weld.toml` when present, then apply the environment.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, WeldError> {
        let mut settings = match path {
            Some(path) => Self::read(path)?,
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    Self::read(default)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_keep_sources(std::env::var(KEEP_SOURCES_ENV).ok().as_deref());
        Ok(settings)
    }

    fn read(path: &Path) -> Result<Self, WeldError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WeldError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_toml(&text)
            .map_err(|e| WeldError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn apply_keep_sources(&mut self, value: Option<&str>) {
        if let Some(value) = value {
            self.export.keep_sources = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let settings = Settings::from_toml("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.export.default_unit_name, "ExportBean");
    }

    #[test]
    fn environment_overrides_file() {
        let mut settings = Settings::from_toml("keep_sources = true").expect("parse");
        settings.apply_keep_sources(None);
        assert!(settings.export.keep_sources);
        settings.apply_keep_sources(Some("0"));
        assert!(!settings.export.keep_sources);
        settings.apply_keep_sources(Some(" YES "));
        assert!(settings.export.keep_sources);
    }

    #[test]
    fn unreadable_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).expect_err("missing");
        assert!(matches!(err, WeldError::Config(_)));
    }
}
