//! # Naming
//!
//! Identifier checks and the naming convention used by generated sources.
//! Everything the validator compares and everything the synthesizer emits
//! goes through these helpers, so both agree on what a name becomes.

use crate::types::{PropertyInfo, PropertyValue};

/// Whether `name` is a syntactically valid identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `name` with its first character uppercased.
#[must_use]
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `name` with its first character lowercased.
#[must_use]
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Unqualified part of a dotted type name.
#[must_use]
pub fn simple_type_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

// =============================================================================
// GENERATED MEMBER NAMES
// =============================================================================

/// Getter generated for an exported property.
#[must_use]
pub fn getter_name(property: &str, is_boolean: bool) -> String {
    let prefix = if is_boolean { "is" } else { "get" };
    format!("{}{}", prefix, upper_first(property))
}

/// Setter generated for an exported property.
#[must_use]
pub fn setter_name(property: &str) -> String {
    format!("set{}", upper_first(property))
}

/// Getter name for a property descriptor.
#[must_use]
pub fn property_getter(info: &PropertyInfo, exported_name: &str) -> String {
    getter_name(exported_name, info.is_boolean())
}

#[must_use]
pub fn add_listener_name(event: &str) -> String {
    format!("add{}EventListener", upper_first(event))
}

#[must_use]
pub fn remove_listener_name(event: &str) -> String {
    format!("remove{}EventListener", upper_first(event))
}

#[must_use]
pub fn get_listeners_name(event: &str) -> String {
    format!("get{}EventListeners", upper_first(event))
}

// =============================================================================
// LITERALS
// =============================================================================

/// Escape a string for use inside a double-quoted source literal.
#[must_use]
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c, '"');
    }
    out
}

fn push_escaped(out: &mut String, c: char, quote: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push(c),
    }
}

/// Source literal reproducing an inlinable value.
///
/// Returns `None` for complex values, which must be persisted instead.
#[must_use]
pub fn literal(value: &PropertyValue) -> Option<String> {
    let text = match value {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Char(c) => {
            let mut out = String::from("'");
            push_escaped(&mut out, *c, '\'');
            out.push('\'');
            out
        }
        PropertyValue::Byte(b) => format!("(byte) {}", b),
        PropertyValue::Short(s) => format!("(short) {}", s),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::Long(l) => format!("{}L", l),
        PropertyValue::Float(f) => {
            if f.is_nan() {
                "Float.NaN".to_string()
            } else if f.is_infinite() {
                if f.is_sign_negative() {
                    "Float.NEGATIVE_INFINITY".to_string()
                } else {
                    "Float.POSITIVE_INFINITY".to_string()
                }
            } else {
                format!("{:?}f", f)
            }
        }
        PropertyValue::Double(d) => {
            if d.is_nan() {
                "Double.NaN".to_string()
            } else if d.is_infinite() {
                if d.is_sign_negative() {
                    "Double.NEGATIVE_INFINITY".to_string()
                } else {
                    "Double.POSITIVE_INFINITY".to_string()
                }
            } else {
                format!("{:?}", d)
            }
        }
        PropertyValue::Str(s) => format!("\"{}\"", escape_literal(s)),
        PropertyValue::Complex(_) => return None,
    };
    Some(text)
}
