//! Dual Emission
//!
//! Both emitters project the same post-transform descriptors - the managed
//! binding unit and the glue unit never inspect each other's output, and
//! share no mutable state. One compilation unit is produced per namespace
//! on each side.

pub mod binding;
pub mod glue;

use crate::namespace::Namespace;
use crate::types::{BridgeFunctionDescriptor, CONVENTION_VERSION};

/// GameObject name the glue side addresses completions to. The host app is
/// expected to forward `<Namespace>_OnBridgeComplete` messages to the
/// namespace's generated `OnBridgeComplete` method.
pub const DISPATCHER_OBJECT: &str = "BridgeDispatcher";

/// One emitted compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedUnit {
    pub namespace: Namespace,
    pub file_name: String,
    pub text: String,
}

/// The coordinated pair of artifacts for one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedPair {
    pub namespace: Namespace,
    pub managed: EmittedUnit,
    pub glue: EmittedUnit,
}

/// Emit both units for one namespace's descriptors.
pub fn emit_namespace(namespace: &Namespace, descriptors: &[BridgeFunctionDescriptor]) -> EmittedPair {
    EmittedPair {
        namespace: namespace.clone(),
        managed: EmittedUnit {
            namespace: namespace.clone(),
            file_name: format!("{}.cs", namespace.dotted()),
            text: binding::emit_unit(namespace, descriptors),
        },
        glue: EmittedUnit {
            namespace: namespace.clone(),
            file_name: format!("{}.jslib", namespace.dotted()),
            text: glue::emit_unit(namespace, descriptors),
        },
    }
}

pub(crate) fn header_comment() -> String {
    format!(
        "// Generated by bridgegen; boundary convention v{CONVENTION_VERSION}. Do not edit by hand."
    )
}

/// `logEvent` -> `LogEvent`, for the managed wrapper surface.
pub(crate) fn pascal_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
