//! Glue Emitter
//!
//! Renders the browser-side library unit for one namespace: one function
//! per extern declaration, matching its arity and order exactly, decoding
//! parameters per marshal strategy and dispatching into the host-registered
//! handler table. Async functions complete through a single-fire closure -
//! success and failure paths share it, so no code path can report the same
//! correlation id twice.

use crate::emit::{header_comment, DISPATCHER_OBJECT};
use crate::mapper;
use crate::namespace::Namespace;
use crate::types::{BridgeFunctionDescriptor, MarshalStrategy, ParamRole, TypeTag};

/// Render the full glue unit for one namespace.
pub fn emit_unit(namespace: &Namespace, descriptors: &[BridgeFunctionDescriptor]) -> String {
    let mut out = String::new();
    out.push_str(&header_comment());
    out.push('\n');
    out.push_str("mergeInto(LibraryManager.library, {\n");

    for desc in descriptors {
        emit_function(&mut out, namespace, desc);
    }

    out.push_str("});\n");
    out
}

fn emit_function(out: &mut String, namespace: &Namespace, desc: &BridgeFunctionDescriptor) {
    let ident = desc.boundary_identifier();
    let param_names = desc
        .params
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    out.push_str(&format!("  {ident}: function ({param_names}) {{\n"));

    // Decode every value parameter per its marshal strategy.
    let value_params: Vec<_> = desc
        .params
        .iter()
        .filter(|p| p.role == ParamRole::Value)
        .collect();
    for param in &value_params {
        out.push_str(&format!(
            "    var {name}Val = {decode};\n",
            name = param.name,
            decode = decode_expr(param.tag, &param.name),
        ));
    }
    out.push_str(
        "    var host = (typeof globalThis !== 'undefined' ? globalThis : window).BridgeHost;\n",
    );

    let args = value_params
        .iter()
        .map(|p| format!("{}Val", p.name))
        .collect::<Vec<_>>()
        .join(", ");

    if desc.is_async {
        emit_async_body(out, namespace, desc, &ident, &args);
    } else {
        emit_sync_body(out, desc, &ident, &args);
    }

    out.push_str("  },\n\n");
}

fn emit_async_body(
    out: &mut String,
    namespace: &Namespace,
    desc: &BridgeFunctionDescriptor,
    ident: &str,
    args: &str,
) {
    let flat = namespace.flat();
    // Single-fire guard: success and failure both route through `complete`,
    // so at most one completion is issued per correlation id.
    out.push_str("    var fired = false;\n");
    out.push_str("    var complete = function (result) {\n");
    out.push_str("      if (fired) { return; }\n");
    out.push_str("      fired = true;\n");
    out.push_str(&format!(
        "      var payload = {};\n",
        payload_expr(desc.return_tag)
    ));
    out.push_str(&format!(
        "      SendMessage('{DISPATCHER_OBJECT}', '{flat}_OnBridgeComplete', callbackId + '|' + payload);\n"
    ));
    out.push_str("    };\n");
    out.push_str(&format!(
        "    host.dispatchAsync('{ident}', [{args}], complete);\n"
    ));
}

fn emit_sync_body(out: &mut String, desc: &BridgeFunctionDescriptor, ident: &str, args: &str) {
    match desc.return_tag {
        TypeTag::Void => {
            out.push_str(&format!("    host.dispatch('{ident}', [{args}]);\n"));
        }
        TypeTag::Number => {
            out.push_str(&format!("    return host.dispatch('{ident}', [{args}]);\n"));
        }
        TypeTag::Boolean => {
            out.push_str(&format!(
                "    return host.dispatch('{ident}', [{args}]) ? 1 : 0;\n"
            ));
        }
        TypeTag::String => {
            out.push_str(&format!("    var ret = host.dispatch('{ident}', [{args}]);\n"));
            emit_string_return(out, "ret == null ? '' : String(ret)");
        }
        TypeTag::StringArray | TypeTag::NumberArray | TypeTag::Json => {
            out.push_str(&format!("    var ret = host.dispatch('{ident}', [{args}]);\n"));
            emit_string_return(out, "JSON.stringify(ret)");
        }
    }
}

/// Allocate a UTF-8 buffer for a string-valued return. The managed side
/// owns the copy once the call returns.
fn emit_string_return(out: &mut String, expr: &str) {
    out.push_str(&format!("    var retStr = {expr};\n"));
    out.push_str("    var size = lengthBytesUTF8(retStr) + 1;\n");
    out.push_str("    var buffer = _malloc(size);\n");
    out.push_str("    stringToUTF8(retStr, buffer, size);\n");
    out.push_str("    return buffer;\n");
}

fn decode_expr(tag: TypeTag, name: &str) -> String {
    match mapper::marshal(tag) {
        MarshalStrategy::Verbatim => name.to_string(),
        MarshalStrategy::BoolAsInt => format!("{name} !== 0"),
        MarshalStrategy::Utf8String => format!("UTF8ToString({name})"),
        MarshalStrategy::JsonString => format!("JSON.parse(UTF8ToString({name}))"),
    }
}

/// How the completion result is flattened into the payload string.
fn payload_expr(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Void => "''",
        TypeTag::String => "result == null ? '' : result",
        TypeTag::Number => "String(result)",
        TypeTag::Boolean => "result ? '1' : '0'",
        TypeTag::StringArray | TypeTag::NumberArray | TypeTag::Json => "JSON.stringify(result)",
    }
}
