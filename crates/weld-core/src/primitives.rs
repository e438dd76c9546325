//! # Export Primitives
//!
//! Fixed constants of the export contract: identifier limits, reserved
//! name pools and the names generated code relies on.
//!
//! These are compiled in and immutable at runtime. Changing any of them
//! changes which units pass validation.

/// Maximum length of any generated identifier (unit, node or feature name).
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Words that can never be used as identifiers in generated sources.
///
/// Language keywords plus the literal words `true`, `false`, `null` and `_`.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "_",
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "void",
    "volatile",
    "while",
];

/// Method names the generated class already defines or inherits.
///
/// Compared case-insensitively (entries are lowercase).
pub const RESERVED_METHOD_NAMES: &[&str] = &[
    "getclass",
    "getpeer",
    "notify",
    "wait",
    "propertychange",
    "notifyall",
    "addpropertychangelistener",
    "removepropertychangelistener",
    "getpropertychangelisteners",
];

/// Field names the generated class already defines (lowercase).
pub const RESERVED_PROPERTY_NAMES: &[&str] = &["propertychangesupport", "serialversionuid"];

/// Event names handled by the generated change-notification support (lowercase).
pub const RESERVED_EVENT_NAMES: &[&str] = &["propertychange"];

/// Type names the generated sources import or extend.
pub const RESERVED_CLASS_NAMES: &[&str] = &[
    "PropertyChangeListener",
    "PropertyChangeSupport",
    "Object",
    "Class",
    "Serializable",
    "PropertyChangeEvent",
];

/// Event set excluded from per-node events; handled by change support.
pub const CHANGE_EVENT_NAME: &str = "propertyChange";

/// Suffix appended to artifact names that lack it.
pub const ARTIFACT_EXTENSION: &str = ".jar";

/// Location of the manifest inside the content root.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Directory (inside the content root) where member archives are staged.
pub const LIBRARY_DIR: &str = "lib";

/// Subdirectory of the bean package holding serialized default values.
pub const PROPERTIES_DIR: &str = "properties";

/// Subdirectory of the bean package holding generated adapters.
pub const ADAPTERS_DIR: &str = "adapters";

/// Prefix of generated property-binding adapter classes.
pub const ADAPTER_PREFIX: &str = "PropertyHookup_";

/// Suffix of generated companion metadata classes.
pub const METADATA_SUFFIX: &str = "BeanInfo";

/// Extension of the machine-readable metadata twin.
pub const METADATA_JSON_EXTENSION: &str = ".metadata.json";

/// Check whether `word` is a reserved keyword (exact match).
#[must_use]
pub fn is_reserved_keyword(word: &str) -> bool {
    RESERVED_KEYWORDS.binary_search(&word).is_ok()
}

/// Check a lowercase-compared name against one of the lowercase pools.
#[must_use]
pub fn in_pool(pool: &[&str], name: &str) -> bool {
    let lower = name.to_lowercase();
    pool.iter().any(|entry| *entry == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_sorted_for_binary_search() {
        let mut sorted = RESERVED_KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_KEYWORDS);
    }

    #[test]
    fn literal_words_are_reserved() {
        for word in ["true", "false", "null", "_", "class", "goto"] {
            assert!(is_reserved_keyword(word), "{word} should be reserved");
        }
        assert!(!is_reserved_keyword("Class"));
    }

    #[test]
    fn pools_compare_case_insensitively() {
        assert!(in_pool(RESERVED_METHOD_NAMES, "getClass"));
        assert!(in_pool(RESERVED_PROPERTY_NAMES, "serialVersionUID"));
        assert!(!in_pool(RESERVED_EVENT_NAMES, "imageChanged"));
    }
}
