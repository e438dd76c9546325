//! # Unit Metadata
//!
//! Machine-readable twin of the generated metadata class. Written next to the
//! generated sources as `<Name>.metadata.json` and read back by tooling that
//! cannot load the metadata class itself.

use crate::graph::{CompositionUnit, Feature};
use crate::naming::{add_listener_name, remove_listener_name};
use crate::types::WeldError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataProperty {
    pub name: String,
    pub display_name: String,
    pub type_name: String,
    #[serde(default)]
    pub editor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEvent {
    pub name: String,
    pub listener_type: String,
    pub listener_methods: Vec<String>,
    pub add_method: String,
    pub remove_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataMethod {
    pub name: String,
    pub params: Vec<String>,
}

/// Introspection surface of one generated class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub name: String,
    /// Fully qualified name of the generated class.
    pub class_name: String,
    pub change_support: bool,
    pub properties: Vec<MetadataProperty>,
    pub events: Vec<MetadataEvent>,
    pub methods: Vec<MetadataMethod>,
}

impl UnitMetadata {
    /// Metadata describing the exported features of `unit`.
    #[must_use]
    pub fn from_unit(unit: &CompositionUnit, package: &str) -> Self {
        let properties = unit
            .exported_properties()
            .into_iter()
            .map(|p| MetadataProperty {
                name: p.name().to_string(),
                display_name: p.info.display_name().to_string(),
                type_name: p.info.type_name.clone(),
                editor: p.info.editor.clone(),
            })
            .collect();
        let events = unit
            .exported_events()
            .into_iter()
            .map(|e| MetadataEvent {
                name: e.name().to_string(),
                listener_type: e.event_set.listener_type.clone(),
                listener_methods: e.event_set.listener_methods.clone(),
                add_method: add_listener_name(e.name()),
                remove_method: remove_listener_name(e.name()),
            })
            .collect();
        let methods = unit
            .exported_methods()
            .into_iter()
            .map(|m| MetadataMethod {
                name: m.name().to_string(),
                params: m.signature.params.clone(),
            })
            .collect();
        Self {
            name: unit.name.clone(),
            class_name: format!("{}.{}", package.replace('/', "."), unit.name),
            change_support: unit.change_support,
            properties,
            events,
            methods,
        }
    }

    pub fn to_json(&self) -> Result<String, WeldError> {
        serde_json::to_string_pretty(self).map_err(|e| WeldError::Io(e.to_string()))
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Parse a metadata file written during synthesis.
pub fn read_metadata(path: &Path) -> Result<UnitMetadata, WeldError> {
    let text = std::fs::read_to_string(path).map_err(|e| WeldError::io("Reading metadata", &e))?;
    serde_json::from_str(&text).map_err(|e| WeldError::Archive(format!("Metadata: {}", e)))
}

/// Parse metadata stored inside a packed archive.
pub fn read_archived_metadata(bytes: &[u8]) -> Result<UnitMetadata, WeldError> {
    serde_json::from_slice(bytes).map_err(|e| WeldError::Archive(format!("Metadata: {}", e)))
}
