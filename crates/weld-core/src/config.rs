//! # Export Configuration
//!
//! Settings that shape generated output. Every field has a default, so an
//! empty configuration file is valid.

use serde::{Deserialize, Serialize};

/// Package path of generated classes.
pub const DEFAULT_BEAN_PACKAGE: &str = "weld/generated/beans";

/// Prefix of generated unit names (`ExportBean0`, `ExportBean1`, ...).
pub const DEFAULT_UNIT_NAME: &str = "ExportBean";

fn default_bean_package() -> String {
    DEFAULT_BEAN_PACKAGE.to_string()
}

fn default_unit_name() -> String {
    DEFAULT_UNIT_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// `/`-separated package path of generated classes.
    #[serde(default = "default_bean_package")]
    pub bean_package: String,
    #[serde(default = "default_unit_name")]
    pub default_unit_name: String,
    /// Keep the scratch directory after a successful export.
    #[serde(default)]
    pub keep_sources: bool,
    /// Initial change-notification flag of every unit.
    #[serde(default)]
    pub change_support: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bean_package: default_bean_package(),
            default_unit_name: default_unit_name(),
            keep_sources: false,
            change_support: false,
        }
    }
}

impl ExportConfig {
    /// Package in dotted form, as written in generated sources.
    #[must_use]
    pub fn package_name(&self) -> String {
        self.bean_package.replace('/', ".")
    }

    #[must_use]
    pub fn properties_dir(&self) -> String {
        format!("{}/{}", self.bean_package, crate::primitives::PROPERTIES_DIR)
    }

    #[must_use]
    pub fn adapters_dir(&self) -> String {
        format!("{}/{}", self.bean_package, crate::primitives::ADAPTERS_DIR)
    }

    /// Initial name of the unit built from the `index`-th group.
    #[must_use]
    pub fn unit_name(&self, index: usize) -> String {
        format!("{}{}", self.default_unit_name, index)
    }
}
