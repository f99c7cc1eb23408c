//! Signature Extraction
//!
//! Turns one source module's exports into pre-transform
//! [`BridgeFunctionDescriptor`]s. Only top-level exported function
//! declarations are eligible; other exports are informational skips, except
//! a non-function export squatting on a recognized bridge marker name,
//! which is flagged so the author learns object-style registration is not
//! supported.
//!
//! Extraction is fail-fast per module: one parameter with an unmapped type
//! fails the whole module with file and symbol context, never a partial
//! result.

mod parser;

pub use parser::{ParseError, RawExport, RawParam, RawSignature};

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::GenerateError;
use crate::mapper;
use crate::namespace::Namespace;
use crate::types::{BridgeFunctionDescriptor, Parameter, TypeTag};

/// Export names reserved for object-style bridge registration, which this
/// generator deliberately does not support.
pub const BRIDGE_MARKERS: &[&str] = &["bridge", "bridgeExports"];

/// Why an export was not treated as a bridge function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    DefaultExport,
    NonFunctionExport,
    /// A non-function export using a bridge marker name.
    NotABridgeFunction,
}

/// An export that was seen and deliberately not bound. Logged, reported,
/// never a build failure.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedExport {
    pub file: PathBuf,
    pub symbol: String,
    pub reason: SkipReason,
}

/// Everything extraction produces for one module.
#[derive(Debug)]
pub struct ModuleExtraction {
    pub descriptors: Vec<BridgeFunctionDescriptor>,
    pub skips: Vec<SkippedExport>,
}

/// Extract all bridge function descriptors from one module.
pub fn extract_module(
    file: &Path,
    source: &str,
    namespace: &Namespace,
) -> Result<ModuleExtraction, GenerateError> {
    let exports = parser::scan_module(source).map_err(|err| GenerateError::Extraction {
        file: file.to_path_buf(),
        message: err.to_string(),
    })?;

    let mut descriptors = Vec::new();
    let mut skips = Vec::new();

    for export in exports {
        match export {
            RawExport::Function(sig) => {
                descriptors.push(lower_signature(file, namespace, &sig)?);
            }
            RawExport::Default { .. } => {
                debug!(file = %file.display(), "skipping default export");
                skips.push(SkippedExport {
                    file: file.to_path_buf(),
                    symbol: "default".to_string(),
                    reason: SkipReason::DefaultExport,
                });
            }
            RawExport::Other { name, keyword, .. } => {
                let reason = if BRIDGE_MARKERS.contains(&name.as_str()) {
                    warn!(
                        file = %file.display(),
                        symbol = %name,
                        "'{name}' is a reserved bridge marker but is not an exported \
                         function; object-style registration is not supported"
                    );
                    SkipReason::NotABridgeFunction
                } else {
                    debug!(
                        file = %file.display(),
                        symbol = %name,
                        keyword = %keyword,
                        "skipping non-function export"
                    );
                    SkipReason::NonFunctionExport
                };
                skips.push(SkippedExport {
                    file: file.to_path_buf(),
                    symbol: name,
                    reason,
                });
            }
        }
    }

    Ok(ModuleExtraction { descriptors, skips })
}

/// Lower one raw signature into a descriptor, resolving every declared type
/// through the type mapper.
fn lower_signature(
    file: &Path,
    namespace: &Namespace,
    sig: &RawSignature,
) -> Result<BridgeFunctionDescriptor, GenerateError> {
    let (is_async, return_tag) = resolve_return(file, sig)?;

    let mut params = Vec::with_capacity(sig.params.len());
    let last = sig.params.len().saturating_sub(1);
    for (idx, raw) in sig.params.iter().enumerate() {
        if mapper::is_function_type(&raw.ty) {
            // A trailing callback on an async function is kept so the
            // transform can refuse it with full context; anywhere else a
            // function can't cross the boundary at all.
            if is_async && idx == last {
                params.push(Parameter::callback(raw.name.clone(), TypeTag::Void));
                continue;
            }
            return Err(GenerateError::UnsupportedType {
                file: file.to_path_buf(),
                symbol: sig.name.clone(),
                type_name: raw.ty.clone(),
            });
        }
        let tag = mapper::map_source_type(&raw.ty).map_err(|err| {
            GenerateError::UnsupportedType {
                file: file.to_path_buf(),
                symbol: sig.name.clone(),
                type_name: err.0,
            }
        })?;
        params.push(Parameter::value(raw.name.clone(), tag));
    }

    Ok(BridgeFunctionDescriptor {
        name: sig.name.clone(),
        namespace: namespace.clone(),
        params,
        is_async,
        return_tag,
    })
}

/// Work out the async flag and the resolved (non-deferred) return tag.
fn resolve_return(
    file: &Path,
    sig: &RawSignature,
) -> Result<(bool, TypeTag), GenerateError> {
    let declared = sig.return_type.as_deref().map(str::trim);

    let (is_async, inner) = match declared {
        Some(text) if text == "Promise" => (true, None),
        Some(text) => match promise_inner(text) {
            Some(inner) => (true, Some(inner)),
            None => (sig.has_async_keyword, Some(text)),
        },
        None => (sig.has_async_keyword, None),
    };

    let return_tag = match inner {
        None => TypeTag::Void,
        Some(text) => mapper::map_source_type(text).map_err(|err| {
            GenerateError::UnsupportedType {
                file: file.to_path_buf(),
                symbol: sig.name.clone(),
                type_name: err.0,
            }
        })?,
    };

    Ok((is_async, return_tag))
}

/// `Promise<T>` -> `T`. Anything else -> None.
fn promise_inner(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("Promise")?.trim_start();
    let rest = rest.strip_prefix('<')?;
    let rest = rest.strip_suffix('>')?;
    Some(rest.trim())
}
