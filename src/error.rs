//! Error types for the generation pipeline.
//!
//! One taxonomy for everything that can stop a module or namespace from
//! emitting. Verifier findings live separately in [`crate::verify`] - they
//! describe disagreement between already-emitted artifacts, not generation
//! failure.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised during extraction, transform, or output writing.
///
/// Any of these aborts generation for the offending module's namespace only;
/// other namespaces still emit, and the error is collected into the
/// [`crate::report::GenerationReport`] instead of halting the run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A parameter or return type with no canonical tag. Never coerced to a
    /// default - the whole module's extraction fails.
    #[error("unsupported type '{type_name}' on '{symbol}' in {file}", file = .file.display())]
    UnsupportedType {
        file: PathBuf,
        symbol: String,
        type_name: String,
    },

    /// Two modules resolved to the same (namespace, function) pair.
    #[error(
        "duplicate binding {namespace}.{function}: declared in both {first} and {second}",
        first = .first.display(),
        second = .second.display()
    )]
    DuplicateBinding {
        namespace: String,
        function: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// An async function that also hand-declares a trailing callback
    /// parameter. The transform refuses to guess which callback wins.
    #[error("'{symbol}' in {file} returns a deferred result but declares callback parameter '{param}'", file = .file.display())]
    AmbiguousCallbackDeclaration {
        file: PathBuf,
        symbol: String,
        param: String,
    },

    /// A parameter using the name synthesized for the correlation id. The
    /// name is reserved on every function so the verifier can treat it as
    /// the async marker without guessing.
    #[error("'{symbol}' in {file} declares parameter '{param}', which is reserved for the boundary correlation id", file = .file.display())]
    ReservedParameterName {
        file: PathBuf,
        symbol: String,
        param: String,
    },

    /// Syntax-level failure while scanning a source module.
    #[error("extraction failed for {file}: {message}", file = .file.display())]
    Extraction { file: PathBuf, message: String },

    /// I/O failure reading sources or writing artifacts.
    #[error("io error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// Stable kind name used in reports and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::UnsupportedType { .. } => "UnsupportedType",
            GenerateError::DuplicateBinding { .. } => "DuplicateBinding",
            GenerateError::AmbiguousCallbackDeclaration { .. } => "AmbiguousCallbackDeclaration",
            GenerateError::ReservedParameterName { .. } => "ReservedParameterName",
            GenerateError::Extraction { .. } => "Extraction",
            GenerateError::Io { .. } => "Io",
        }
    }

    /// Source file the error is attached to, when there is one.
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            GenerateError::UnsupportedType { file, .. }
            | GenerateError::AmbiguousCallbackDeclaration { file, .. }
            | GenerateError::ReservedParameterName { file, .. }
            | GenerateError::Extraction { file, .. } => Some(file),
            GenerateError::DuplicateBinding { first, .. } => Some(first),
            GenerateError::Io { path, .. } => Some(path),
        }
    }

    /// Symbol the error is attached to, when there is one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            GenerateError::UnsupportedType { symbol, .. }
            | GenerateError::AmbiguousCallbackDeclaration { symbol, .. }
            | GenerateError::ReservedParameterName { symbol, .. } => Some(symbol),
            GenerateError::DuplicateBinding { function, .. } => Some(function),
            _ => None,
        }
    }
}
