//! # weld-core
//!
//! The composition export pipeline for Weld.
//!
//! A set of live components wired by event and property bindings goes in;
//! one self-contained artifact per connected group comes out. The stages run
//! strictly in sequence:
//!
//! 1. `partition`: split the wrappers into connected groups
//! 2. `build_unit`: build the composition graph of one group
//! 3. `infer_interfaces`: mark input and output nodes
//! 4. `validate`: collect every naming and interface violation
//! 5. `synthesize`: generate sources, metadata and manifest, then pack
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - Deterministic: BTreeMap/BTreeSet only, generated names are numbered
//! - Reflection, interactive selection, compilation and value encoding are
//!   collaborators behind the traits in `providers`

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod config;
pub mod exporter;
pub mod formats;
pub mod graph;
pub mod inference;
pub mod naming;
pub mod partition;
pub mod primitives;
pub mod providers;
pub mod synthesis;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AdapterTarget, Capability, ComplexValue, ComponentInfo, ComponentRef, ConstraintViolation,
    EventSetInfo, EventTarget, GroupId, InterfaceSide, MethodInfo, MethodSig, NodeId,
    PropertyInfo, PropertyTarget, PropertyValue, ViolationKind, WeldError, Wrapper, WrapperId,
};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use builder::{CompositionGraphBuilder, build_unit};
pub use config::ExportConfig;
pub use exporter::{Exporter, UnitFailure};
pub use graph::{
    CompositionEdge, CompositionNode, CompositionUnit, DeclaringCapability, EdgeKind,
    ExportEvent, ExportFeature, ExportMethod, ExportProperty, Feature,
};
pub use inference::{InterfaceInferencer, infer_interfaces};
pub use partition::{GroupPartitioner, WrapperGroup, partition};
pub use providers::{
    ArchiveBuild, BuildService, ComponentDescriptor, DescriptorEntry, DescriptorTable,
    NodeCandidate, NodeSelector, PostcardValueStore, ScriptedSelector, ValuePersistence,
};
pub use synthesis::{
    ArtifactSynthesizer, CancelFlag, PackagedArtifact, SynthesisOutcome, synthesize,
};
pub use validation::{ConstraintValidator, validate};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{Archive, ArchiveEntry, ArchiveHeader, UnitMetadata, read_metadata};
#[cfg(feature = "crypto-hash")]
pub use formats::archive_digest;
