//! Canonical Bridge Type System
//!
//! This module provides the emitter-agnostic representation used across
//! bridgegen:
//! - **TypeTag** - closed enumeration of types that may cross the boundary
//! - **BridgeFunctionDescriptor** - one exported bridge function, the single
//!   source of truth both emitters project from
//! - **Boundary identifier flattening** - the one naming rule both emitted
//!   artifacts (and the verifier) agree on
//!
//! Descriptors are immutable once produced; each pipeline stage returns new
//! values rather than editing upstream output in place.

use serde::Serialize;

use crate::namespace::Namespace;

/// Version of the boundary naming/completion convention. Bumped whenever the
/// flattening rule or the completion message shape changes.
pub const CONVENTION_VERSION: u32 = 1;

/// Canonical type tag for values crossing the bridge boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Void,
    StringArray,
    NumberArray,
    /// Structured value; travels as JSON text on the wire.
    Json,
}

/// How a value of a given tag is moved across the boundary by the glue side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarshalStrategy {
    /// Numbers pass through unchanged (doubles on both sides).
    Verbatim,
    /// Booleans travel as 0/1 integers.
    BoolAsInt,
    /// Strings travel as UTF-8 pointers, decoded/allocated at the boundary.
    Utf8String,
    /// Arrays and structured values travel as JSON-encoded strings.
    JsonString,
}

/// Role of a parameter in the boundary calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamRole {
    Value,
    /// The synthesized trailing correlation-id parameter of an async
    /// function, or a hand-declared callback caught before transform.
    Callback,
}

/// One parameter of a bridge function. Order within the parameter list is
/// significant and preserved end-to-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub tag: TypeTag,
    pub role: ParamRole,
}

impl Parameter {
    pub fn value(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            role: ParamRole::Value,
        }
    }

    pub fn callback(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            role: ParamRole::Callback,
        }
    }
}

/// Canonical description of one exported bridge function.
///
/// After the async transform, a descriptor with `is_async = true` carries
/// exactly one trailing `Callback` parameter (the correlation id) and its
/// boundary return type is `Void`; the resolved result type stays in
/// `return_tag` for the completion payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeFunctionDescriptor {
    pub name: String,
    pub namespace: Namespace,
    pub params: Vec<Parameter>,
    pub is_async: bool,
    pub return_tag: TypeTag,
}

impl BridgeFunctionDescriptor {
    /// The flattened identifier shared by the extern declaration, the glue
    /// function, and the verifier: namespace segments and function name
    /// joined with underscores (convention v1).
    ///
    /// `Analytics.Firebase` + `logEvent` -> `Analytics_Firebase_logEvent`
    pub fn boundary_identifier(&self) -> String {
        format!("{}_{}", self.namespace.flat(), self.name)
    }

    /// Return type at the boundary. Async results travel through the
    /// completion callback, so the boundary-level return is always void.
    pub fn boundary_return(&self) -> TypeTag {
        if self.is_async {
            TypeTag::Void
        } else {
            self.return_tag
        }
    }

    /// Whether the trailing correlation-id parameter has been appended.
    pub fn has_correlation_param(&self) -> bool {
        matches!(
            self.params.last(),
            Some(p) if p.role == ParamRole::Callback
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_identifier_flattens_with_underscores() {
        let desc = BridgeFunctionDescriptor {
            name: "logEvent".to_string(),
            namespace: Namespace::from_segments(vec![
                "Analytics".to_string(),
                "Firebase".to_string(),
            ]),
            params: vec![],
            is_async: false,
            return_tag: TypeTag::Void,
        };
        assert_eq!(desc.boundary_identifier(), "Analytics_Firebase_logEvent");
    }
}
