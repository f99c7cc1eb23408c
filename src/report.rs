//! Generation Report
//!
//! The structured result of one generation run: per-namespace success or
//! failure, informational skips, and any cross-artifact violations. The
//! build pipeline consuming this report must fail the build on any
//! error-class entry; skips are logged and never fatal.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::GenerateError;
use crate::extract::SkippedExport;
use crate::verify::InvariantViolation;

/// A generation error flattened for reporting: stable kind, source context,
/// human-readable message.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedError {
    pub kind: String,
    pub file: Option<PathBuf>,
    pub symbol: Option<String>,
    pub message: String,
}

impl From<&GenerateError> for ReportedError {
    fn from(err: &GenerateError) -> Self {
        Self {
            kind: err.kind().to_string(),
            file: err.file().cloned(),
            symbol: err.symbol().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// A verifier finding flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedViolation {
    pub kind: String,
    pub message: String,
}

impl From<&InvariantViolation> for ReportedViolation {
    fn from(violation: &InvariantViolation) -> Self {
        Self {
            kind: violation.kind().to_string(),
            message: violation.to_string(),
        }
    }
}

/// Outcome for one namespace.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceOutcome {
    pub namespace: String,
    /// Boundary identifiers emitted for this namespace, in emission order.
    pub functions: Vec<String>,
    /// Set when extraction or transform aborted this namespace. A failed
    /// namespace contributes nothing to either artifact.
    pub error: Option<ReportedError>,
    /// Cross-artifact findings from the verification pass.
    pub violations: Vec<ReportedViolation>,
}

impl NamespaceOutcome {
    pub fn emitted(namespace: String, functions: Vec<String>) -> Self {
        Self {
            namespace,
            functions,
            error: None,
            violations: Vec::new(),
        }
    }

    pub fn failed(namespace: String, error: &GenerateError) -> Self {
        Self {
            namespace,
            functions: Vec::new(),
            error: Some(ReportedError::from(error)),
            violations: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some() || !self.violations.is_empty()
    }
}

/// Full result of one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub namespaces: Vec<NamespaceOutcome>,
    pub skips: Vec<SkippedExport>,
}

impl GenerationReport {
    /// True when the run contains any error-class entry - a failed
    /// namespace or a verifier violation. Skips don't count.
    pub fn has_errors(&self) -> bool {
        self.namespaces.iter().any(NamespaceOutcome::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.namespaces
            .iter()
            .map(|ns| {
                usize::from(ns.error.is_some()) + ns.violations.len()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn skips_do_not_count_as_errors() {
        let report = GenerationReport {
            namespaces: vec![NamespaceOutcome::emitted(
                "Utils".to_string(),
                vec!["Utils_log".to_string()],
            )],
            skips: vec![crate::extract::SkippedExport {
                file: PathBuf::from("utils.ts"),
                symbol: "helper".to_string(),
                reason: crate::extract::SkipReason::NonFunctionExport,
            }],
        };
        assert!(!report.has_errors());
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn failed_namespace_counts_as_error() {
        let err = GenerateError::Extraction {
            file: PathBuf::from("m.ts"),
            message: "unexpected end of input".to_string(),
        };
        let report = GenerationReport {
            namespaces: vec![NamespaceOutcome::failed("M".to_string(), &err)],
            skips: vec![],
        };
        assert!(report.has_errors());
        assert_eq!(report.namespaces[0].error.as_ref().map(|e| e.kind.as_str()), Some("Extraction"));
    }
}
