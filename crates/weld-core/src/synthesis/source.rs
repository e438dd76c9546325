//! # Generated Sources
//!
//! Text of the composed class, its metadata class and the property-binding
//! adapters. Output is deterministic: the same unit always yields the same
//! bytes, so descriptor variables are numbered rather than randomized.

use super::plan::{AdapterSpec, WiringPlan};
use crate::graph::{CompositionUnit, EdgeKind, ExportProperty, Feature};
use crate::naming::{
    add_listener_name, escape_literal, get_listeners_name, property_getter, remove_listener_name,
    setter_name, upper_first,
};
use crate::primitives::{ADAPTERS_DIR, CHANGE_EVENT_NAME, METADATA_SUFFIX};
use crate::types::{MethodSig, NodeId};

const SERIALIZABLE: &str = "java.io.Serializable";
const CHANGE_LISTENER: &str = "java.beans.PropertyChangeListener";
const CHANGE_SUPPORT: &str = "java.beans.PropertyChangeSupport";

/// How a frozen property value is restored in the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// `node.setter(literal);`
    Inline {
        node: NodeId,
        setter: String,
        literal: String,
    },
    /// Read back from a persisted blob next to the class.
    Resource {
        node: NodeId,
        setter: String,
        type_name: String,
        /// Path relative to the generated class.
        resource: String,
    },
}

/// Indentation-aware line buffer.
#[derive(Debug, Default)]
struct SourceWriter {
    out: String,
    depth: usize,
}

impl SourceWriter {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str("    ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(&format!("{} {{", text));
        self.depth = self.depth.saturating_add(1);
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    /// Close the current block and open the next on the same line.
    fn reopen(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("}} {} {{", text));
        self.depth = self.depth.saturating_add(1);
    }

    fn close_catch(&mut self, exception: &str) {
        self.reopen(&format!("catch ({} e)", exception));
        self.line("e.printStackTrace();");
        self.close();
    }

    fn finish(self) -> String {
        self.out
    }
}

/// `T0 arg0, T1 arg1, ...`
fn parameter_list(params: &[String]) -> String {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} arg{}", p, i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `arg0, arg1, ...`
fn argument_list(count: usize) -> String {
    (0..count)
        .map(|i| format!("arg{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn throws_clause(sig: &MethodSig) -> String {
    if sig.exceptions.is_empty() {
        String::new()
    } else {
        format!(" throws {}", sig.exceptions.join(", "))
    }
}

fn field(unit: &CompositionUnit, id: NodeId) -> String {
    WiringPlan::field(unit, id)
}

// =============================================================================
// COMPOSED CLASS
// =============================================================================

/// Source of the composed class.
pub fn bean_source(
    unit: &CompositionUnit,
    plan: &WiringPlan<'_>,
    defaults: &[DefaultValue],
    package: &str,
) -> String {
    let mut w = SourceWriter::default();
    w.line(&format!("package {};", package));
    w.line("");

    let mut interfaces = vec![SERIALIZABLE.to_string()];
    interfaces.extend(
        unit.implemented_capabilities()
            .into_iter()
            .map(|c| c.name.clone()),
    );
    if unit.change_support {
        interfaces.push(CHANGE_LISTENER.to_string());
    }
    w.open(&format!(
        "public class {} implements {}",
        unit.name,
        interfaces.join(", ")
    ));
    w.line("private static final long serialVersionUID = 1L;");
    w.line("");

    for node in unit.nodes() {
        w.line(&format!(
            "private {} {};",
            node.component.type_name,
            field(unit, node.id)
        ));
    }
    if unit.change_support {
        w.line(&format!(
            "private {0} propertyChangeSupport = new {0}(this);",
            CHANGE_SUPPORT
        ));
    }
    w.line("");

    write_constructor(&mut w, unit, plan, defaults, package);

    for property in unit.exported_properties() {
        write_accessors(&mut w, unit, property);
    }

    for event in unit.exported_events() {
        let target = field(unit, event.feature.node);
        let set = &event.event_set;
        w.line("");
        w.open(&format!(
            "public void {}({} listener)",
            add_listener_name(event.name()),
            set.listener_type
        ));
        w.line(&format!("{}.{}(listener);", target, set.add_method));
        w.close();
        w.line("");
        w.open(&format!(
            "public void {}({} listener)",
            remove_listener_name(event.name()),
            set.listener_type
        ));
        w.line(&format!("{}.{}(listener);", target, set.remove_method));
        w.close();
        if let Some(get_method) = &set.get_method {
            w.line("");
            w.open(&format!(
                "public {}[] {}()",
                set.listener_type,
                get_listeners_name(event.name())
            ));
            w.line(&format!("return {}.{}();", target, get_method));
            w.close();
        }
    }

    for method in unit.exported_methods() {
        let sig = &method.signature;
        let call = format!(
            "{}.{}({});",
            field(unit, method.feature.node),
            sig.name,
            argument_list(sig.params.len())
        );
        w.line("");
        w.open(&format!(
            "public {} {}({}){}",
            sig.returns,
            method.name(),
            parameter_list(&sig.params),
            throws_clause(sig)
        ));
        if sig.is_void() {
            w.line(&call);
        } else {
            w.line(&format!("return {}", call));
        }
        w.close();
    }

    if unit.change_support {
        write_change_support(&mut w);
    }

    w.close();
    w.finish()
}

fn write_constructor(
    w: &mut SourceWriter,
    unit: &CompositionUnit,
    plan: &WiringPlan<'_>,
    defaults: &[DefaultValue],
    package: &str,
) {
    w.open(&format!("public {}()", unit.name));
    w.open("try");

    for id in &plan.instantiation {
        if let Some(node) = unit.node(*id) {
            w.line(&format!(
                "{} = new {}();",
                field(unit, *id),
                node.component.type_name
            ));
        }
    }

    for step in &plan.wiring {
        let start = field(unit, step.edge.start);
        let end = field(unit, step.edge.end);
        match (&step.edge.kind, step.hookup) {
            (EdgeKind::Direct { event_set }, _) => {
                w.line(&format!("{}.{}({});", start, event_set.add_method, end));
            }
            (
                EdgeKind::Adapter {
                    event_set,
                    hookup_type,
                    ..
                },
                Some(n),
            ) => {
                w.line(&format!("{0} hookup{1} = new {0}();", hookup_type, n));
                w.line(&format!("hookup{}.setTarget({});", n, end));
                w.line(&format!("{}.{}(hookup{});", start, event_set.add_method, n));
            }
            (EdgeKind::PropertyBinding { event_set, .. }, Some(n)) => {
                let adapter = step.adapter.as_deref().unwrap_or_default();
                let qualified = format!("{}.{}.{}", package, ADAPTERS_DIR, adapter);
                w.line(&format!("{0} hookup{1} = new {0}();", qualified, n));
                w.line(&format!("hookup{}.setTarget({});", n, end));
                w.line(&format!(
                    "{}.add{}Listener(hookup{});",
                    start,
                    upper_first(event_set),
                    n
                ));
            }
            (_, None) => {}
        }
    }

    for default in defaults {
        match default {
            DefaultValue::Inline {
                node,
                setter,
                literal,
            } => {
                w.line(&format!("{}.{}({});", field(unit, *node), setter, literal));
            }
            DefaultValue::Resource {
                node,
                setter,
                type_name,
                resource,
            } => {
                w.open(&format!(
                    "try (java.io.ObjectInputStream in = new java.io.ObjectInputStream(getClass().getResourceAsStream(\"{}\")))",
                    escape_literal(resource)
                ));
                w.line(&format!(
                    "{}.{}(({}) in.readObject());",
                    field(unit, *node),
                    setter,
                    type_name
                ));
                w.close();
            }
        }
    }

    w.close_catch("Exception");
    w.close();
}

fn write_accessors(w: &mut SourceWriter, unit: &CompositionUnit, property: &ExportProperty) {
    let target = field(unit, property.feature.node);
    let info = &property.info;
    let getter = info
        .getter
        .clone()
        .unwrap_or_else(|| MethodSig::getter(property_getter(info, &info.name), &info.type_name));
    let setter = info
        .setter
        .clone()
        .unwrap_or_else(|| MethodSig::void(setter_name(&info.name), &[info.type_name.as_str()]));

    w.line("");
    w.open(&format!(
        "public {} {}({}){}",
        info.type_name,
        property_getter(info, property.name()),
        parameter_list(&getter.params),
        throws_clause(&getter)
    ));
    w.line(&format!(
        "return {}.{}({});",
        target,
        getter.name,
        argument_list(getter.params.len())
    ));
    w.close();

    w.line("");
    w.open(&format!(
        "public void {}({}){}",
        setter_name(property.name()),
        parameter_list(&setter.params),
        throws_clause(&setter)
    ));
    if unit.change_support {
        w.line(&format!(
            "propertyChangeSupport.firePropertyChange(\"{}\", {}.{}(), arg0);",
            escape_literal(property.name()),
            target,
            getter.name
        ));
    }
    w.line(&format!(
        "{}.{}({});",
        target,
        setter.name,
        argument_list(setter.params.len())
    ));
    w.close();
}

fn write_change_support(w: &mut SourceWriter) {
    w.line("");
    w.open(&format!(
        "public void addPropertyChangeListener({} listener)",
        CHANGE_LISTENER
    ));
    w.line("propertyChangeSupport.addPropertyChangeListener(listener);");
    w.close();
    w.line("");
    w.open(&format!(
        "public void removePropertyChangeListener({} listener)",
        CHANGE_LISTENER
    ));
    w.line("propertyChangeSupport.removePropertyChangeListener(listener);");
    w.close();
    w.line("");
    w.open(&format!(
        "public {}[] getPropertyChangeListeners()",
        CHANGE_LISTENER
    ));
    w.line("return propertyChangeSupport.getPropertyChangeListeners();");
    w.close();
    w.line("");
    w.line("@Override");
    w.open("public void propertyChange(java.beans.PropertyChangeEvent evt)");
    w.close();
}

// =============================================================================
// METADATA CLASS
// =============================================================================

/// Source of the `<Name>BeanInfo` class.
pub fn metadata_source(unit: &CompositionUnit, package: &str) -> String {
    let class_name = format!("{}{}", unit.name, METADATA_SUFFIX);
    let properties = unit.exported_properties();
    let events = unit.exported_events();
    let methods = unit.exported_methods();

    let mut w = SourceWriter::default();
    w.line(&format!("package {};", package));
    w.line("");
    w.open(&format!(
        "public class {} extends java.beans.SimpleBeanInfo implements {}",
        class_name, SERIALIZABLE
    ));
    w.line("private static final long serialVersionUID = 1L;");

    w.line("");
    w.line("@Override");
    w.open("public java.beans.PropertyDescriptor[] getPropertyDescriptors()");
    if properties.is_empty() {
        w.line("return new java.beans.PropertyDescriptor[]{};");
    } else {
        w.open("try");
        w.line(&format!("Class<?> cls = {}.class;", unit.name));
        let mut names = Vec::new();
        for (i, p) in properties.iter().enumerate() {
            let var = format!("pd{}_{}", upper_first(p.name()), i);
            w.line(&format!(
                "java.beans.PropertyDescriptor {} = new java.beans.PropertyDescriptor(\"{}\", cls);",
                var,
                escape_literal(p.name())
            ));
            w.line(&format!(
                "{}.setDisplayName(\"{}\");",
                var,
                escape_literal(p.info.display_name())
            ));
            if let Some(editor) = &p.info.editor {
                w.line(&format!("{}.setPropertyEditorClass({}.class);", var, editor));
            }
            names.push(var);
        }
        w.line(&format!(
            "return new java.beans.PropertyDescriptor[]{{{}}};",
            names.join(", ")
        ));
        w.close_catch("java.beans.IntrospectionException");
        w.line("return null;");
    }
    w.close();

    w.line("");
    w.line("@Override");
    w.open("public java.beans.EventSetDescriptor[] getEventSetDescriptors()");
    if events.is_empty() && !unit.change_support {
        w.line("return new java.beans.EventSetDescriptor[]{};");
    } else {
        w.open("try");
        w.line(&format!("Class<?> cls = {}.class;", unit.name));
        let mut names = Vec::new();
        if unit.change_support {
            w.line(&format!(
                "java.beans.EventSetDescriptor esdPropertyChange = new java.beans.EventSetDescriptor(cls, \"{0}\", {1}.class, \"{0}\");",
                CHANGE_EVENT_NAME, CHANGE_LISTENER
            ));
            names.push("esdPropertyChange".to_string());
        }
        for (i, e) in events.iter().enumerate() {
            let var = format!("esd{}_{}", upper_first(e.name()), i);
            let listener_methods = e
                .event_set
                .listener_methods
                .iter()
                .map(|m| format!("\"{}\"", escape_literal(m)))
                .collect::<Vec<_>>()
                .join(", ");
            w.line(&format!(
                "java.beans.EventSetDescriptor {} = new java.beans.EventSetDescriptor(cls, \"{}\", {}.class, new String[]{{{}}}, \"{}\", \"{}\");",
                var,
                escape_literal(e.name()),
                e.event_set.listener_type,
                listener_methods,
                add_listener_name(e.name()),
                remove_listener_name(e.name())
            ));
            names.push(var);
        }
        w.line(&format!(
            "return new java.beans.EventSetDescriptor[]{{{}}};",
            names.join(", ")
        ));
        w.close_catch("java.beans.IntrospectionException");
        w.line("return null;");
    }
    w.close();

    w.line("");
    w.line("@Override");
    w.open("public java.beans.MethodDescriptor[] getMethodDescriptors()");
    if methods.is_empty() {
        w.line("return new java.beans.MethodDescriptor[]{};");
    } else {
        w.open("try");
        w.line(&format!("Class<?> cls = {}.class;", unit.name));
        let mut names = Vec::new();
        for (i, m) in methods.iter().enumerate() {
            let var = format!("md{}_{}", upper_first(m.name()), i);
            let classes = m
                .signature
                .params
                .iter()
                .map(|p| format!("{}.class", p))
                .collect::<Vec<_>>()
                .join(", ");
            w.line(&format!(
                "java.beans.MethodDescriptor {} = new java.beans.MethodDescriptor(cls.getMethod(\"{}\", new Class<?>[]{{{}}}), null);",
                var,
                escape_literal(m.name()),
                classes
            ));
            names.push(var);
        }
        w.line(&format!(
            "return new java.beans.MethodDescriptor[]{{{}}};",
            names.join(", ")
        ));
        w.close_catch("java.lang.NoSuchMethodException");
        w.line("return null;");
    }
    w.close();

    w.close();
    w.finish()
}

// =============================================================================
// PROPERTY ADAPTERS
// =============================================================================

/// Source of one property-binding adapter.
pub fn adapter_source(spec: &AdapterSpec, package: &str) -> String {
    let mut w = SourceWriter::default();
    w.line(&format!("package {};", package));
    w.line("");
    w.open(&format!(
        "public class {} implements {}, {}",
        spec.class_name, CHANGE_LISTENER, SERIALIZABLE
    ));
    w.line("private static final long serialVersionUID = 1L;");
    w.line("");
    w.line(&format!("private {} target;", spec.target_type));
    w.line("");
    w.open(&format!("public void setTarget({} t)", spec.target_type));
    w.line("target = t;");
    w.close();
    w.line("");
    w.open("public void propertyChange(java.beans.PropertyChangeEvent evt)");
    w.open("try");
    w.line(&format!(
        "target.{}(({}) evt.getNewValue());",
        spec.setter, spec.value_type
    ));
    w.close_catch("Exception");
    w.close();
    w.close();
    w.finish()
}
