//! # Design Files
//!
//! A design file is the JSON snapshot of a composition: the descriptors of
//! every component type in use plus the wrappers and their bindings.
//!
//! ```json
//! {
//!   "components": { "demo.Counter": { "properties": [], "events": [] } },
//!   "wrappers": [
//!     { "id": 1, "label": "Counter",
//!       "component": { "type_name": "demo.Counter", "instance": 1 },
//!       "origin": "lib/counter.jar" }
//!   ]
//! }
//! ```
//!
//! Relative origins and adapter paths resolve against the file's directory.

use serde::{Deserialize, Serialize};
use std::path::Path;
use weld_core::{DescriptorTable, WeldError, Wrapper};

/// Maximum design file size (64 MB).
const MAX_DESIGN_FILE_SIZE: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignFile {
    #[serde(default)]
    pub components: DescriptorTable,
    #[serde(default)]
    pub wrappers: Vec<Wrapper>,
}

impl DesignFile {
    pub fn from_json(text: &str) -> Result<Self, WeldError> {
        serde_json::from_str(text).map_err(|e| WeldError::Config(format!("invalid design: {}", e)))
    }

    /// Read, parse and resolve the design at `path`.
    pub fn load(path: &Path) -> Result<Self, WeldError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            WeldError::Io(format!("cannot read design {}: {}", path.display(), e))
        })?;
        if metadata.len() > MAX_DESIGN_FILE_SIZE {
            return Err(WeldError::Config(format!(
                "design {} is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_DESIGN_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| WeldError::Io(format!("cannot read design {}: {}", path.display(), e)))?;
        let mut design = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            design.resolve_paths(base);
        }
        tracing::debug!(
            path = %path.display(),
            components = design.components.len(),
            wrappers = design.wrappers.len(),
            "loaded design"
        );
        Ok(design)
    }

    /// Make relative origins and adapter paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for wrapper in &mut self.wrappers {
            if wrapper.origin.is_relative() {
                wrapper.origin = base.join(&wrapper.origin);
            }
            for adapter in &mut wrapper.adapter_targets {
                if adapter.hookup_path.is_relative() {
                    adapter.hookup_path = base.join(&adapter.hookup_path);
                }
            }
        }
    }
}
