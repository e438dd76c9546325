//! # Collaborators
//!
//! The pipeline never reflects over components, never asks a human and never
//! runs a compiler itself. Those jobs sit behind the traits in this module:
//!
//! - `ComponentDescriptor`: what a component exposes and which capabilities
//!   its ancestry implements
//! - `NodeSelector`: the interactive fallback of interface inference
//! - `BuildService`: compile generated sources and pack a content root
//! - `ValuePersistence`: persist complex default values
//!
//! Each trait has a deterministic in-process implementation used by the CLI
//! and the tests.

use crate::formats::archive::Archive;
use crate::types::{Capability, ComplexValue, ComponentInfo, ComponentRef, NodeId, WeldError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

// =============================================================================
// COMPONENT DESCRIPTOR
// =============================================================================

/// Reads the exposed surface of a live component.
pub trait ComponentDescriptor {
    /// Properties, methods and event sets of `component`.
    fn describe(&self, component: &ComponentRef) -> Result<ComponentInfo, WeldError>;

    /// Every capability implemented anywhere in the component's ancestry.
    fn ancestry(&self, component: &ComponentRef) -> Result<Vec<Capability>, WeldError>;
}

/// Descriptor entry of one component type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorEntry {
    #[serde(flatten)]
    pub info: ComponentInfo,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// In-memory descriptor keyed by fully qualified type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorTable {
    entries: BTreeMap<String, DescriptorEntry>,
}

impl DescriptorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the entry for `type_name`.
    pub fn insert(&mut self, type_name: impl Into<String>, entry: DescriptorEntry) {
        self.entries.insert(type_name.into(), entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, component: &ComponentRef) -> Result<&DescriptorEntry, WeldError> {
        self.entries
            .get(&component.type_name)
            .ok_or_else(|| WeldError::Introspection {
                component: component.type_name.clone(),
                reason: "no descriptor registered for type".to_string(),
            })
    }
}

impl ComponentDescriptor for DescriptorTable {
    fn describe(&self, component: &ComponentRef) -> Result<ComponentInfo, WeldError> {
        self.entry(component).map(|e| e.info.clone())
    }

    fn ancestry(&self, component: &ComponentRef) -> Result<Vec<Capability>, WeldError> {
        self.entry(component).map(|e| e.capabilities.clone())
    }
}

// =============================================================================
// NODE SELECTOR
// =============================================================================

/// What the selector is shown about each node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeCandidate {
    pub id: NodeId,
    pub name: String,
    pub type_name: String,
}

/// Lets a human pick nodes when inference cannot decide.
///
/// May block indefinitely. An empty result means the selection was cancelled.
pub trait NodeSelector {
    fn select_nodes(&mut self, candidates: &[NodeCandidate], prompt: &str) -> Vec<NodeId>;
}

/// Answers selections from a queue of node-name lists.
///
/// Each call consumes one answer; once the queue is empty every call is
/// treated as cancelled. Prompts are recorded.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    answers: VecDeque<Vec<String>>,
    prompts: Vec<String>,
}

impl ScriptedSelector {
    #[must_use]
    pub fn new<I, A, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|a| a.into_iter().map(Into::into).collect())
                .collect(),
            prompts: Vec::new(),
        }
    }

    /// A selector that cancels every request.
    #[must_use]
    pub fn cancelling() -> Self {
        Self::default()
    }

    /// Prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl NodeSelector for ScriptedSelector {
    fn select_nodes(&mut self, candidates: &[NodeCandidate], prompt: &str) -> Vec<NodeId> {
        self.prompts.push(prompt.to_string());
        let Some(answer) = self.answers.pop_front() else {
            return Vec::new();
        };
        candidates
            .iter()
            .filter(|c| answer.iter().any(|name| *name == c.name))
            .map(|c| c.id)
            .collect()
    }
}

// =============================================================================
// BUILD SERVICE
// =============================================================================

/// External compile-and-pack toolchain.
pub trait BuildService {
    /// Compile every source below `source_root` against `classpath`.
    /// Returns the produced files.
    fn compile(&self, source_root: &Path, classpath: &[PathBuf]) -> Result<Vec<PathBuf>, WeldError>;

    /// Pack `content_root` into `output_file`.
    fn pack(&self, output_file: &Path, content_root: &Path) -> Result<PathBuf, WeldError>;

    /// Entry names a resource contributes to the packaged artifact.
    fn list_entries(&self, resource: &Path) -> Result<Vec<String>, WeldError> {
        default_entries(resource)
    }
}

/// Entries of a weld archive, or the bare file name of anything else.
fn default_entries(resource: &Path) -> Result<Vec<String>, WeldError> {
    if !resource.is_file() {
        return Err(WeldError::MissingResource(resource.to_path_buf()));
    }
    match Archive::open(resource) {
        Ok(archive) => Ok(archive.entries().iter().map(|e| e.path.clone()).collect()),
        Err(_) => Ok(resource
            .file_name()
            .map(|n| vec![n.to_string_lossy().into_owned()])
            .unwrap_or_default()),
    }
}

/// Ships sources uncompiled and packs into the weld archive format.
///
/// The packed file is a `WELD` archive (postcard encoded, see
/// [`Archive`]), not a zip, even when its name ends in `.jar`. Jar tools
/// cannot open it; use [`Archive::open`] or a build service that packs
/// real jars.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveBuild;

impl BuildService for ArchiveBuild {
    fn compile(&self, source_root: &Path, _classpath: &[PathBuf]) -> Result<Vec<PathBuf>, WeldError> {
        tracing::debug!(root = %source_root.display(), "sources shipped without compilation");
        Ok(Vec::new())
    }

    fn pack(&self, output_file: &Path, content_root: &Path) -> Result<PathBuf, WeldError> {
        let archive = Archive::from_directory(content_root)?;
        archive.write_to(output_file)?;
        Ok(output_file.to_path_buf())
    }
}

// =============================================================================
// VALUE PERSISTENCE
// =============================================================================

/// Persists non-primitive default values as side artifacts.
pub trait ValuePersistence {
    /// File extension of produced blobs, without the dot.
    fn extension(&self) -> &str;

    fn serialize(&self, value: &ComplexValue) -> Result<Vec<u8>, String>;
}

/// Postcard-encoded value snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardValueStore;

impl ValuePersistence for PostcardValueStore {
    fn extension(&self) -> &str {
        "ser"
    }

    fn serialize(&self, value: &ComplexValue) -> Result<Vec<u8>, String> {
        if !value.serializable {
            return Err(format!("{} is not serializable", value.type_name));
        }
        postcard::to_stdvec(value).map_err(|e| e.to_string())
    }
}
