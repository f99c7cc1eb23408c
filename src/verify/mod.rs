//! Invariant Verification
//!
//! Re-parses the two emitted units for a namespace and checks that they
//! agree on the boundary calling convention. Runs as a separate pass after
//! emission, over text only, so it can be pointed at previously generated,
//! stale, or hand-edited artifacts. Violations are reported, never
//! auto-corrected - rewriting the output would hide a generation defect.

mod parser;

pub use parser::{parse_glue_functions, parse_managed_externs, GlueFunction, ManagedExtern};

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::transform::CORRELATION_PARAM;

/// Which artifact a finding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Managed,
    Glue,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Managed => f.write_str("managed"),
            Side::Glue => f.write_str("glue"),
        }
    }
}

/// A disagreement between the two emitted artifacts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("'{identifier}' has no counterpart in the {missing_from} artifact")]
    MissingCounterpart {
        identifier: String,
        missing_from: Side,
    },

    #[error("'{identifier}' arity mismatch: managed declares {managed}, glue declares {glue}")]
    ArityMismatch {
        identifier: String,
        managed: usize,
        glue: usize,
    },

    #[error("'{identifier}' callback parameter is not in trailing position on the {side} side")]
    CallbackPositionMismatch { identifier: String, side: Side },

    #[error("'{identifier}' has {count} completion call sites, expected exactly one")]
    CompletionPatternViolation { identifier: String, count: usize },
}

impl InvariantViolation {
    /// Stable kind name used in reports and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            InvariantViolation::MissingCounterpart { .. } => "MissingCounterpart",
            InvariantViolation::ArityMismatch { .. } => "ArityMismatch",
            InvariantViolation::CallbackPositionMismatch { .. } => "CallbackPositionMismatch",
            InvariantViolation::CompletionPatternViolation { .. } => "CompletionPatternViolation",
        }
    }
}

/// Check one namespace's emitted pair. Returns every violation found, in
/// identifier order, so repeated runs report identically.
pub fn verify_units(managed: &str, glue: &str) -> Vec<InvariantViolation> {
    let externs: BTreeMap<String, ManagedExtern> = parse_managed_externs(managed)
        .into_iter()
        .map(|e| (e.identifier.clone(), e))
        .collect();
    let glue_fns: BTreeMap<String, GlueFunction> = parse_glue_functions(glue)
        .into_iter()
        .map(|f| (f.identifier.clone(), f))
        .collect();

    let mut violations = Vec::new();

    for (identifier, ext) in &externs {
        let Some(glue_fn) = glue_fns.get(identifier) else {
            violations.push(InvariantViolation::MissingCounterpart {
                identifier: identifier.clone(),
                missing_from: Side::Glue,
            });
            continue;
        };

        if ext.params.len() != glue_fn.params.len() {
            violations.push(InvariantViolation::ArityMismatch {
                identifier: identifier.clone(),
                managed: ext.params.len(),
                glue: glue_fn.params.len(),
            });
        }

        check_callback_position(identifier, ext, glue_fn, &mut violations);
        check_completion_pattern(identifier, glue_fn, &mut violations);
    }

    for identifier in glue_fns.keys() {
        if !externs.contains_key(identifier) {
            violations.push(InvariantViolation::MissingCounterpart {
                identifier: identifier.clone(),
                missing_from: Side::Managed,
            });
        }
    }

    violations
}

fn check_callback_position(
    identifier: &str,
    ext: &ManagedExtern,
    glue_fn: &GlueFunction,
    violations: &mut Vec<InvariantViolation>,
) {
    let managed_idx = ext
        .params
        .iter()
        .position(|p| p.name == CORRELATION_PARAM);
    let glue_idx = glue_fn
        .params
        .iter()
        .position(|p| p == CORRELATION_PARAM);

    if managed_idx.is_none() && glue_idx.is_none() {
        return;
    }

    match managed_idx {
        Some(idx) if idx + 1 == ext.params.len() => {}
        _ => violations.push(InvariantViolation::CallbackPositionMismatch {
            identifier: identifier.to_string(),
            side: Side::Managed,
        }),
    }
    match glue_idx {
        Some(idx) if idx + 1 == glue_fn.params.len() => {}
        _ => violations.push(InvariantViolation::CallbackPositionMismatch {
            identifier: identifier.to_string(),
            side: Side::Glue,
        }),
    }
}

fn check_completion_pattern(
    identifier: &str,
    glue_fn: &GlueFunction,
    violations: &mut Vec<InvariantViolation>,
) {
    let sites = glue_fn.body.matches("SendMessage(").count();
    let is_async = glue_fn.params.last().map(String::as_str) == Some(CORRELATION_PARAM);

    let expected = if is_async { 1 } else { 0 };
    if sites != expected {
        violations.push(InvariantViolation::CompletionPatternViolation {
            identifier: identifier.to_string(),
            count: sites,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit;
    use crate::namespace;
    use crate::transform::CORRELATION_PARAM;
    use crate::types::{BridgeFunctionDescriptor, Parameter, TypeTag};
    use std::path::PathBuf;

    fn emitted_pair() -> (String, String) {
        let ns = namespace::resolve(&PathBuf::from("analytics/firebase.ts"));
        let descriptors = vec![
            BridgeFunctionDescriptor {
                name: "setUserId".to_string(),
                namespace: ns.clone(),
                params: vec![Parameter::value("id", TypeTag::String)],
                is_async: false,
                return_tag: TypeTag::Void,
            },
            BridgeFunctionDescriptor {
                name: "logEvent".to_string(),
                namespace: ns.clone(),
                params: vec![
                    Parameter::value("name", TypeTag::String),
                    Parameter::value("value", TypeTag::Number),
                    Parameter::callback(CORRELATION_PARAM, TypeTag::Number),
                ],
                is_async: true,
                return_tag: TypeTag::Void,
            },
        ];
        let pair = emit::emit_namespace(&ns, &descriptors);
        (pair.managed.text, pair.glue.text)
    }

    #[test]
    fn freshly_emitted_pair_verifies_clean() {
        let (managed, glue) = emitted_pair();
        assert_eq!(verify_units(&managed, &glue), vec![]);
    }

    #[test]
    fn deleted_glue_function_is_missing_counterpart() {
        let (managed, glue) = emitted_pair();
        let tampered: String = glue
            .lines()
            .filter(|l| !l.contains("Analytics_Firebase_setUserId"))
            .collect::<Vec<_>>()
            .join("\n");

        let violations = verify_units(&managed, &tampered);
        assert!(violations.iter().any(|v| matches!(
            v,
            InvariantViolation::MissingCounterpart {
                identifier,
                missing_from: Side::Glue,
            } if identifier == "Analytics_Firebase_setUserId"
        )));
    }

    #[test]
    fn dropped_glue_parameter_is_arity_mismatch() {
        let (managed, glue) = emitted_pair();
        let tampered = glue.replace(
            "function (name, value, callbackId)",
            "function (name, callbackId)",
        );

        let violations = verify_units(&managed, &tampered);
        assert!(violations.iter().any(|v| matches!(
            v,
            InvariantViolation::ArityMismatch {
                managed: 3,
                glue: 2,
                ..
            }
        )));
    }

    #[test]
    fn reordered_callback_is_position_mismatch() {
        let (managed, glue) = emitted_pair();
        let tampered = glue.replace(
            "function (name, value, callbackId)",
            "function (name, callbackId, value)",
        );

        let violations = verify_units(&managed, &tampered);
        assert!(violations.iter().any(|v| matches!(
            v,
            InvariantViolation::CallbackPositionMismatch {
                side: Side::Glue,
                ..
            }
        )));
    }

    #[test]
    fn duplicated_completion_site_is_pattern_violation() {
        let (managed, glue) = emitted_pair();
        let completion_line = glue
            .lines()
            .find(|l| l.contains("SendMessage("))
            .expect("completion line")
            .to_string();
        let tampered = glue.replace(
            &completion_line,
            &format!("{completion_line}\n{completion_line}"),
        );

        let violations = verify_units(&managed, &tampered);
        assert!(violations.iter().any(|v| matches!(
            v,
            InvariantViolation::CompletionPatternViolation { count: 2, .. }
        )));
    }
}
