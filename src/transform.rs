//! Async Transform
//!
//! Makes every descriptor's calling convention boundary-safe. The two
//! runtimes share no asynchronous primitive, so a deferred result cannot
//! cross as a return value: async functions get one synthesized trailing
//! correlation-id parameter and a `void` boundary return, and the real
//! result travels back through the completion callback.
//!
//! Sync descriptors pass through untouched. An async function that already
//! hand-declares a trailing callback is refused outright - authoring must
//! not mix a hand-rolled callback with a deferred return, and guessing
//! which one wins would bake the wrong convention into both artifacts.

use std::path::Path;

use crate::error::GenerateError;
use crate::types::{BridgeFunctionDescriptor, ParamRole, Parameter, TypeTag};

/// Name of the synthesized correlation-id parameter. Both emitters and the
/// verifier key off this exact name (convention v1).
pub const CORRELATION_PARAM: &str = "callbackId";

/// Apply the boundary transform to one descriptor.
pub fn transform(
    file: &Path,
    desc: BridgeFunctionDescriptor,
) -> Result<BridgeFunctionDescriptor, GenerateError> {
    // The correlation name is reserved on sync functions too: downstream,
    // a trailing parameter with this name *is* the async marker, and the
    // async wrapper declares a local under it.
    if let Some(reserved) = desc
        .params
        .iter()
        .find(|p| p.role == ParamRole::Value && p.name == CORRELATION_PARAM)
    {
        return Err(GenerateError::ReservedParameterName {
            file: file.to_path_buf(),
            symbol: desc.name,
            param: reserved.name.clone(),
        });
    }

    if let Some(callback) = desc.params.iter().find(|p| p.role == ParamRole::Callback) {
        return Err(GenerateError::AmbiguousCallbackDeclaration {
            file: file.to_path_buf(),
            symbol: desc.name,
            param: callback.name.clone(),
        });
    }

    if !desc.is_async {
        return Ok(desc);
    }

    let mut params = desc.params;
    params.push(Parameter::callback(CORRELATION_PARAM, TypeTag::Number));

    Ok(BridgeFunctionDescriptor {
        name: desc.name,
        namespace: desc.namespace,
        params,
        // Preserved so the emitters synthesize continuation plumbing; the
        // resolved result type stays in `return_tag` for the completion
        // payload, while the boundary-level return is void.
        is_async: true,
        return_tag: desc.return_tag,
    })
}
