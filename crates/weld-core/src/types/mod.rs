//! # Core Type Definitions
//!
//! This module contains the types shared by every pipeline stage:
//! - Identifiers (`WrapperId`, `NodeId`, `GroupId`)
//! - The consumed design-time model (`Wrapper` and its binding targets)
//! - Component descriptions read from the descriptor collaborator
//!   (`ComponentInfo`, `PropertyInfo`, `MethodInfo`, `EventSetInfo`, `Capability`)
//! - Property values captured for default freezing (`PropertyValue`)
//! - Validation results (`ConstraintViolation`)
//! - Error types (`WeldError`)
//!
//! ## Determinism Guarantees
//!
//! Identifiers implement `Ord` so every collection keyed by them can be a
//! `BTreeMap`/`BTreeSet`. Nothing in this module depends on hashing order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identity of a wrapper in the design-time environment.
///
/// Bindings refer to their targets by this id, never by object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WrapperId(pub u64);

/// Index of a node inside its unit's node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Position of the node in its unit.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Label of a connected group during partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u64);

// =============================================================================
// COMPONENT DESCRIPTIONS
// =============================================================================

/// Handle to the live component a wrapper holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Fully qualified type name of the component (e.g. `solution.MedianFilter`).
    pub type_name: String,
    /// Opaque instance handle, meaningful only to the descriptor provider.
    #[serde(default)]
    pub instance: u64,
}

impl ComponentRef {
    /// Create a component reference.
    #[must_use]
    pub fn new(type_name: impl Into<String>, instance: u64) -> Self {
        Self {
            type_name: type_name.into(),
            instance,
        }
    }

    /// The unqualified type name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.type_name
            .rsplit('.')
            .next()
            .unwrap_or(self.type_name.as_str())
    }
}

fn void_type() -> String {
    "void".to_string()
}

/// A method signature as seen by the descriptor provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    /// Fully qualified parameter types, in order.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default = "void_type")]
    pub returns: String,
    /// Declared checked exceptions.
    #[serde(default)]
    pub exceptions: Vec<String>,
}

impl MethodSig {
    /// A `void` method with the given parameter types.
    #[must_use]
    pub fn void(name: impl Into<String>, params: &[&str]) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            returns: void_type(),
            exceptions: Vec::new(),
        }
    }

    /// A method returning `returns` with no parameters.
    #[must_use]
    pub fn getter(name: impl Into<String>, returns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: returns.into(),
            exceptions: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.returns == "void"
    }

    /// Same name and same parameter types. Return types are not compared.
    #[must_use]
    pub fn same_signature(&self, other: &MethodSig) -> bool {
        self.name == other.name && self.params == other.params
    }

    /// Whether `name` with `params` denotes this signature.
    #[must_use]
    pub fn matches(&self, name: &str, params: &[String]) -> bool {
        self.name == name && self.params == params
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// A readable/writable attribute of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Fully qualified property type (`int`, `java.lang.String`, ...).
    pub type_name: String,
    #[serde(default)]
    pub getter: Option<MethodSig>,
    #[serde(default)]
    pub setter: Option<MethodSig>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub expert: bool,
    /// Custom editor type registered for the property, if any.
    #[serde(default)]
    pub editor: Option<String>,
    /// The property's current value on the live component.
    #[serde(default)]
    pub value: Option<PropertyValue>,
}

impl PropertyInfo {
    /// Display name, falling back to the programmatic name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.type_name == "boolean" || self.type_name == "java.lang.Boolean"
    }
}

/// A callable operation of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub signature: MethodSig,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub expert: bool,
}

/// An event set a component fires, with its listener registration methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSetInfo {
    /// Event set name (e.g. `imageChanged`).
    pub name: String,
    /// Fully qualified listener type.
    pub listener_type: String,
    /// Methods of the listener type that receive the events.
    #[serde(default)]
    pub listener_methods: Vec<String>,
    /// Registration method on the source (e.g. `addImageChangedListener`).
    pub add_method: String,
    pub remove_method: String,
    /// Optional accessor returning all registered listeners.
    #[serde(default)]
    pub get_method: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub expert: bool,
}

/// Everything the descriptor provider reports about one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    #[serde(default)]
    pub properties: Vec<PropertyInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub events: Vec<EventSetInfo>,
}

/// An interface implemented somewhere in a component's ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Fully qualified interface name.
    pub name: String,
    /// Whether this is a listener-style capability.
    #[serde(default)]
    pub listener: bool,
    /// Methods declared directly by this capability.
    #[serde(default)]
    pub methods: Vec<MethodSig>,
    /// Capabilities this one extends directly.
    #[serde(default)]
    pub extends: Vec<String>,
}

// =============================================================================
// WRAPPER (consumed design-time model)
// =============================================================================

/// A binding whose source event set is wired straight into the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTarget {
    pub target: WrapperId,
    pub event_set: EventSetInfo,
}

/// A binding routed through a glue listener generated at design time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterTarget {
    pub target: WrapperId,
    pub event_set: EventSetInfo,
    /// Fully qualified type of the glue listener.
    pub hookup_type: String,
    /// Location of the compiled glue listener.
    pub hookup_path: PathBuf,
}

/// A property change forwarded into a setter of the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTarget {
    pub target: WrapperId,
    /// Event set carrying the change (usually `propertyChange`).
    pub event_set: String,
    /// Setter invoked on the target with the new value.
    pub setter: MethodSig,
}

/// A live component plus its declared outgoing bindings.
///
/// Owned by the design-time environment; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub id: WrapperId,
    /// User-visible label; becomes the initial node name.
    pub label: String,
    pub component: ComponentRef,
    /// Archive the component's type was loaded from.
    pub origin: PathBuf,
    #[serde(default)]
    pub direct_targets: Vec<EventTarget>,
    #[serde(default)]
    pub adapter_targets: Vec<AdapterTarget>,
    #[serde(default)]
    pub property_targets: Vec<PropertyTarget>,
    /// Properties the user modified explicitly.
    #[serde(default)]
    pub changed_properties: BTreeSet<String>,
}

impl Wrapper {
    /// Create a wrapper with no bindings.
    #[must_use]
    pub fn new(
        id: WrapperId,
        label: impl Into<String>,
        component: ComponentRef,
        origin: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            component,
            origin: origin.into(),
            direct_targets: Vec::new(),
            adapter_targets: Vec::new(),
            property_targets: Vec::new(),
            changed_properties: BTreeSet::new(),
        }
    }

    /// Every wrapper this one binds to, in declaration order
    /// (direct, then adapter, then property bindings).
    pub fn binding_targets(&self) -> impl Iterator<Item = WrapperId> + '_ {
        self.direct_targets
            .iter()
            .map(|t| t.target)
            .chain(self.adapter_targets.iter().map(|t| t.target))
            .chain(self.property_targets.iter().map(|t| t.target))
    }
}

// =============================================================================
// PROPERTY VALUES
// =============================================================================

/// A non-primitive value that has to be persisted as a side artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexValue {
    pub type_name: String,
    /// Whether the value supports persistence at all.
    #[serde(default = "default_true")]
    pub serializable: bool,
    /// Field snapshot handed to the value persistence service.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

/// Current value of a component property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Complex(ComplexValue),
}

impl PropertyValue {
    /// Primitive, boxed primitive, string or null: can be inlined as a literal.
    #[must_use]
    pub fn is_inlinable(&self) -> bool {
        !matches!(self, Self::Complex(_))
    }
}

// =============================================================================
// CONSTRAINT VIOLATIONS
// =============================================================================

/// Which rule a violation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    MissingName,
    TooLong,
    InvalidIdentifier,
    Reserved,
    ResourceConflict,
    NameCollision,
    PartialCapability,
}

/// One failed validation rule. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    kind: ViolationKind,
    message: String,
}

impl ConstraintViolation {
    #[must_use]
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Which side of a unit's interface an inference concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceSide {
    Input,
    Output,
}

impl fmt::Display for InterfaceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Errors that can occur while exporting.
///
/// Every error is fatal to the unit being processed only; sibling units are
/// unaffected. Constraint violations are not errors (see `ConstraintViolation`).
#[derive(Debug, Error)]
pub enum WeldError {
    /// The descriptor provider could not describe a component.
    #[error("Introspection of {component} failed: {reason}")]
    Introspection { component: String, reason: String },

    /// Interface inference was ambiguous and the fallback selection was empty.
    #[error("Unit {unit}: no {side} interface selected")]
    EmptyInterface { unit: String, side: InterfaceSide },

    /// A generated name collides with an existing file or resource.
    #[error("Resource conflict: {0}")]
    ResourceConflict(String),

    /// A resource required for packaging does not exist.
    #[error("Resource not found or invalid: {0}")]
    MissingResource(PathBuf),

    /// A frozen default value could not be persisted.
    #[error("Error serializing property {node}:{property}: {reason}")]
    ValueSerialization {
        node: String,
        property: String,
        reason: String,
    },

    /// The external build-and-pack service failed.
    #[error("Build failed: {0}")]
    Build(String),

    /// Synthesis was cancelled before completion.
    #[error("Export cancelled")]
    Cancelled,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An archive could not be read or written.
    #[error("Archive error: {0}")]
    Archive(String),
}

impl WeldError {
    /// Whether this error belongs to the synthesis stage (and therefore
    /// triggered scratch cleanup).
    #[must_use]
    pub fn is_synthesis_failure(&self) -> bool {
        matches!(
            self,
            Self::ResourceConflict(_)
                | Self::MissingResource(_)
                | Self::ValueSerialization { .. }
                | Self::Build(_)
                | Self::Cancelled
                | Self::Io(_)
        )
    }

    pub(crate) fn io(context: &str, err: &std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_targets_cover_all_binding_kinds() {
        let event_set = EventSetInfo {
            name: "action".to_string(),
            listener_type: "java.awt.event.ActionListener".to_string(),
            listener_methods: vec!["actionPerformed".to_string()],
            add_method: "addActionListener".to_string(),
            remove_method: "removeActionListener".to_string(),
            get_method: None,
            hidden: false,
            expert: false,
        };
        let mut wrapper = Wrapper::new(
            WrapperId(1),
            "Button",
            ComponentRef::new("demo.Button", 1),
            "button.jar",
        );
        wrapper.direct_targets.push(EventTarget {
            target: WrapperId(2),
            event_set: event_set.clone(),
        });
        wrapper.adapter_targets.push(AdapterTarget {
            target: WrapperId(3),
            event_set,
            hookup_type: "tmp.Hookup_1".to_string(),
            hookup_path: PathBuf::from("tmp/Hookup_1.class"),
        });
        wrapper.property_targets.push(PropertyTarget {
            target: WrapperId(4),
            event_set: "propertyChange".to_string(),
            setter: MethodSig::void("setLabel", &["java.lang.String"]),
        });

        let targets: Vec<_> = wrapper.binding_targets().collect();
        assert_eq!(targets, vec![WrapperId(2), WrapperId(3), WrapperId(4)]);
    }

    #[test]
    fn same_signature_ignores_return_type() {
        let a = MethodSig::void("apply", &["int"]);
        let mut b = a.clone();
        b.returns = "int".to_string();
        assert!(a.same_signature(&b));
        assert!(!a.same_signature(&MethodSig::void("apply", &["long"])));
    }

    #[test]
    fn simple_name_strips_package() {
        assert_eq!(
            ComponentRef::new("solution.MedianFilter", 0).simple_name(),
            "MedianFilter"
        );
        assert_eq!(ComponentRef::new("Plain", 0).simple_name(), "Plain");
    }

    #[test]
    fn synthesis_failures_are_grouped() {
        assert!(WeldError::Cancelled.is_synthesis_failure());
        assert!(WeldError::MissingResource(PathBuf::from("x.jar")).is_synthesis_failure());
        assert!(
            !WeldError::EmptyInterface {
                unit: "Combo".to_string(),
                side: InterfaceSide::Input,
            }
            .is_synthesis_failure()
        );
    }

    #[test]
    fn property_value_json_shape() {
        let value: PropertyValue =
            serde_json::from_str(r#"{"kind":"int","value":5}"#).expect("parse");
        assert_eq!(value, PropertyValue::Int(5));
        let null: PropertyValue = serde_json::from_str(r#"{"kind":"null"}"#).expect("parse");
        assert_eq!(null, PropertyValue::Null);
    }
}
