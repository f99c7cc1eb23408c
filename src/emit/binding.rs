//! Binding Emitter
//!
//! Renders the managed-language compilation unit for one namespace: extern
//! declarations matching the glue calling convention exactly, public
//! wrapper methods with the authored calling convention, and - when the
//! namespace has async functions - the pending-call table, correlation-id
//! allocation, the completion dispatcher, and the timeout hook.

use crate::emit::{header_comment, pascal_case, DISPATCHER_OBJECT};
use crate::mapper;
use crate::namespace::Namespace;
use crate::transform::CORRELATION_PARAM;
use crate::types::{BridgeFunctionDescriptor, MarshalStrategy, ParamRole, TypeTag};

/// Render the full managed unit for one namespace.
pub fn emit_unit(namespace: &Namespace, descriptors: &[BridgeFunctionDescriptor]) -> String {
    let class_name = format!("{}Bridge", namespace.leaf());
    let has_async = descriptors.iter().any(|d| d.is_async);
    let needs_string_array = descriptors
        .iter()
        .flat_map(|d| d.params.iter())
        .any(|p| p.tag == TypeTag::StringArray);
    let needs_number_array = descriptors
        .iter()
        .flat_map(|d| d.params.iter())
        .any(|p| p.tag == TypeTag::NumberArray);

    let mut out = String::new();
    out.push_str(&header_comment());
    out.push('\n');
    out.push_str("using System;\n");
    out.push_str("using System.Collections.Generic;\n");
    out.push_str("using System.Runtime.InteropServices;\n");
    out.push_str("using UnityEngine;\n");
    out.push('\n');
    out.push_str(&format!("namespace {}\n{{\n", namespace.dotted()));
    out.push_str(&format!("    public static class {class_name}\n    {{\n"));

    for desc in descriptors {
        emit_extern(&mut out, desc);
    }
    for desc in descriptors {
        emit_wrapper(&mut out, desc);
    }

    if has_async {
        emit_pending_support(&mut out, namespace, &class_name);
    }
    if needs_string_array {
        emit_string_array_helper(&mut out);
    }
    if needs_number_array {
        emit_number_array_helper(&mut out);
    }

    out.push_str("    }\n}\n");
    out
}

fn emit_extern(out: &mut String, desc: &BridgeFunctionDescriptor) {
    let params = desc
        .params
        .iter()
        .map(|p| match p.role {
            ParamRole::Callback => format!("int {}", p.name),
            ParamRole::Value => format!("{} {}", mapper::extern_type(p.tag), p.name),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let ret = extern_return(desc.boundary_return());
    out.push_str("        [DllImport(\"__Internal\")]\n");
    out.push_str(&format!(
        "        private static extern {ret} {ident}({params});\n\n",
        ident = desc.boundary_identifier(),
    ));
}

fn emit_wrapper(out: &mut String, desc: &BridgeFunctionDescriptor) {
    let method = pascal_case(&desc.name);
    let ident = desc.boundary_identifier();

    // The wrapper signature is the authored one: no correlation parameter.
    let value_params: Vec<_> = desc
        .params
        .iter()
        .filter(|p| p.role == ParamRole::Value)
        .collect();
    let sig_params = value_params
        .iter()
        .map(|p| format!("{} {}", mapper::managed_type(p.tag), p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let args = value_params
        .iter()
        .map(|p| wrapper_argument(p.tag, &p.name))
        .collect::<Vec<_>>()
        .join(", ");

    if desc.is_async {
        out.push_str(&format!(
            "        public static PendingCall {method}({sig_params})\n        {{\n"
        ));
        out.push_str(&format!(
            "            int {CORRELATION_PARAM} = NextCallbackId();\n"
        ));
        out.push_str("            var call = new PendingCall();\n");
        out.push_str(&format!(
            "            pending.Add({CORRELATION_PARAM}, call);\n"
        ));
        let full_args = if args.is_empty() {
            CORRELATION_PARAM.to_string()
        } else {
            format!("{args}, {CORRELATION_PARAM}")
        };
        out.push_str(&format!("            {ident}({full_args});\n"));
        out.push_str("            return call;\n");
        out.push_str("        }\n\n");
        return;
    }

    let ret = wrapper_return_type(desc.return_tag);
    out.push_str(&format!(
        "        public static {ret} {method}({sig_params})\n        {{\n"
    ));
    match desc.return_tag {
        TypeTag::Void => {
            out.push_str(&format!("            {ident}({args});\n"));
        }
        TypeTag::Boolean => {
            out.push_str(&format!("            return {ident}({args}) != 0;\n"));
        }
        _ => {
            out.push_str(&format!("            return {ident}({args});\n"));
        }
    }
    out.push_str("        }\n\n");
}

fn emit_pending_support(out: &mut String, namespace: &Namespace, class_name: &str) {
    let flat = namespace.flat();
    out.push_str(&format!(
        r#"        /// Deferred handle for one in-flight call. Resolves at most once.
        public sealed class PendingCall
        {{
            public bool IsDone {{ get; private set; }}
            public bool IsFaulted {{ get; private set; }}
            public string Result {{ get; private set; }}
            public string Error {{ get; private set; }}
            public Action<PendingCall> OnResolved;

            internal void Resolve(string payload)
            {{
                IsDone = true;
                Result = payload;
                var handler = OnResolved;
                if (handler != null) {{ handler(this); }}
            }}

            internal void Fail(string reason)
            {{
                IsDone = true;
                IsFaulted = true;
                Error = reason;
                var handler = OnResolved;
                if (handler != null) {{ handler(this); }}
            }}
        }}

        // One entry per in-flight async call, keyed by correlation id. An
        // id is never reused while its entry is pending: the counter only
        // moves forward.
        private static readonly Dictionary<int, PendingCall> pending = new Dictionary<int, PendingCall>();
        private static int nextCallbackId = 0;

        private static int NextCallbackId()
        {{
            nextCallbackId += 1;
            return nextCallbackId;
        }}

        /// Completion entry point. The glue side sends
        /// "<callbackId>|<payload>" through the {DISPATCHER_OBJECT}
        /// GameObject, which must forward "{flat}_OnBridgeComplete"
        /// messages here.
        public static void OnBridgeComplete(string message)
        {{
            int split = message.IndexOf('|');
            if (split < 0)
            {{
                Debug.LogWarning("{class_name}: malformed completion '" + message + "'");
                return;
            }}
            int callbackId;
            if (!int.TryParse(message.Substring(0, split), out callbackId))
            {{
                Debug.LogWarning("{class_name}: malformed completion id '" + message + "'");
                return;
            }}
            PendingCall call;
            if (!pending.TryGetValue(callbackId, out call))
            {{
                // Stray or duplicate completion; the entry is already gone.
                Debug.LogWarning("{class_name}: no pending call " + callbackId);
                return;
            }}
            pending.Remove(callbackId);
            call.Resolve(message.Substring(split + 1));
        }}

        /// Force-fail a pending call (timeout policy hook). Safe against a
        /// late completion racing in afterwards: the loser finds the entry
        /// gone and only warns.
        public static void FailPending(int callbackId, string reason)
        {{
            PendingCall call;
            if (!pending.TryGetValue(callbackId, out call))
            {{
                return;
            }}
            pending.Remove(callbackId);
            call.Fail(reason);
        }}

"#
    ));
}

fn emit_string_array_helper(out: &mut String) {
    out.push_str(
        r#"        private static string ToJsonArray(string[] values)
        {
            var sb = new System.Text.StringBuilder("[");
            for (int i = 0; i < values.Length; i++)
            {
                if (i > 0) { sb.Append(','); }
                sb.Append('"');
                foreach (char c in values[i])
                {
                    if (c == '"' || c == '\\') { sb.Append('\\').Append(c); }
                    else if (c == '\n') { sb.Append("\\n"); }
                    else if (c == '\r') { sb.Append("\\r"); }
                    else if (c == '\t') { sb.Append("\\t"); }
                    else if (c < ' ') { sb.Append("\\u").Append(((int)c).ToString("x4")); }
                    else { sb.Append(c); }
                }
                sb.Append('"');
            }
            return sb.Append(']').ToString();
        }

"#,
    );
}

fn emit_number_array_helper(out: &mut String) {
    out.push_str(
        r#"        private static string ToJsonArray(double[] values)
        {
            var sb = new System.Text.StringBuilder("[");
            for (int i = 0; i < values.Length; i++)
            {
                if (i > 0) { sb.Append(','); }
                sb.Append(values[i].ToString(System.Globalization.CultureInfo.InvariantCulture));
            }
            return sb.Append(']').ToString();
        }

"#,
    );
}

fn extern_return(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Void => "void",
        other => mapper::extern_type(other),
    }
}

/// Managed return spelling at the wrapper surface. Array and structured
/// results surface as JSON text; callers parse with whatever JSON layer the
/// host app already uses.
fn wrapper_return_type(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Void => "void",
        TypeTag::Boolean => "bool",
        TypeTag::Number => "double",
        TypeTag::String | TypeTag::StringArray | TypeTag::NumberArray | TypeTag::Json => "string",
    }
}

fn wrapper_argument(tag: TypeTag, name: &str) -> String {
    match mapper::marshal(tag) {
        MarshalStrategy::BoolAsInt => format!("{name} ? 1 : 0"),
        MarshalStrategy::JsonString if matches!(tag, TypeTag::StringArray | TypeTag::NumberArray) => {
            format!("ToJsonArray({name})")
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace;
    use crate::types::Parameter;
    use std::path::PathBuf;

    fn firebase_descriptors() -> (Namespace, Vec<BridgeFunctionDescriptor>) {
        let ns = namespace::resolve(&PathBuf::from("analytics/firebase.ts"));
        let sync = BridgeFunctionDescriptor {
            name: "setUserId".to_string(),
            namespace: ns.clone(),
            params: vec![Parameter::value("id", TypeTag::String)],
            is_async: false,
            return_tag: TypeTag::Void,
        };
        let async_fn = BridgeFunctionDescriptor {
            name: "logEvent".to_string(),
            namespace: ns.clone(),
            params: vec![
                Parameter::value("name", TypeTag::String),
                Parameter::value("value", TypeTag::Number),
                Parameter::callback(CORRELATION_PARAM, TypeTag::Number),
            ],
            is_async: true,
            return_tag: TypeTag::Void,
        };
        (ns, vec![sync, async_fn])
    }

    #[test]
    fn extern_matches_boundary_convention() {
        let (ns, descs) = firebase_descriptors();
        let unit = emit_unit(&ns, &descs);

        assert!(unit.contains(
            "private static extern void Analytics_Firebase_setUserId(string id);"
        ));
        assert!(unit.contains(
            "private static extern void Analytics_Firebase_logEvent(string name, double value, int callbackId);"
        ));
    }

    #[test]
    fn async_wrapper_registers_continuation_before_calling_out() {
        let (ns, descs) = firebase_descriptors();
        let unit = emit_unit(&ns, &descs);

        let register = unit.find("pending.Add(callbackId, call);").expect("register");
        let invoke = unit
            .find("Analytics_Firebase_logEvent(name, value, callbackId);")
            .expect("invoke");
        assert!(register < invoke);
        assert!(unit.contains("public static PendingCall LogEvent(string name, double value)"));
    }

    #[test]
    fn sync_only_unit_has_no_pending_table() {
        let ns = namespace::resolve(&PathBuf::from("utils.ts"));
        let desc = BridgeFunctionDescriptor {
            name: "getVersion".to_string(),
            namespace: ns.clone(),
            params: vec![],
            is_async: false,
            return_tag: TypeTag::String,
        };
        let unit = emit_unit(&ns, &[desc]);
        assert!(!unit.contains("PendingCall"));
        assert!(unit.contains("public static string GetVersion()"));
    }

    #[test]
    fn bool_and_array_params_marshal_at_the_call_site() {
        let ns = namespace::resolve(&PathBuf::from("prefs.ts"));
        let desc = BridgeFunctionDescriptor {
            name: "configure".to_string(),
            namespace: ns.clone(),
            params: vec![
                Parameter::value("enabled", TypeTag::Boolean),
                Parameter::value("tags", TypeTag::StringArray),
            ],
            is_async: false,
            return_tag: TypeTag::Void,
        };
        let unit = emit_unit(&ns, &[desc]);
        assert!(unit.contains("Prefs_configure(enabled ? 1 : 0, ToJsonArray(tags));"));
        assert!(unit.contains("public static void Configure(bool enabled, string[] tags)"));
        assert!(unit.contains("ToJsonArray(string[] values)"));
        // The helper must emit valid JSON for control characters too, or
        // the glue side's JSON.parse throws at runtime.
        assert!(unit.contains(r#"else if (c == '\n') { sb.Append("\\n"); }"#));
        assert!(unit.contains(r#"else if (c < ' ') { sb.Append("\\u").Append(((int)c).ToString("x4")); }"#));
    }
}
