//! Type Mapping
//!
//! The static ruleset tying the authoring dialect's type spellings to
//! canonical [`TypeTag`]s, and each tag to its managed-language spelling and
//! glue-side marshaling strategy. Both mappings are total over the
//! enumeration by construction (matches with no fallback arm); an unknown
//! source spelling is a hard error, never a silent coercion - a default tag
//! would leave the two artifacts individually valid but semantically
//! mismatched.

use thiserror::Error;

use crate::types::{MarshalStrategy, TypeTag};

/// A source type spelling with no canonical tag.
#[derive(Debug, Error, PartialEq)]
#[error("no canonical type tag for '{0}'")]
pub struct UnsupportedType(pub String);

/// Resolve a declared source type to its canonical tag.
pub fn map_source_type(source_type: &str) -> Result<TypeTag, UnsupportedType> {
    let normalized = normalize(source_type);
    match normalized.as_str() {
        "string" => Ok(TypeTag::String),
        "number" => Ok(TypeTag::Number),
        "boolean" => Ok(TypeTag::Boolean),
        "void" | "undefined" => Ok(TypeTag::Void),
        "string[]" | "Array<string>" => Ok(TypeTag::StringArray),
        "number[]" | "Array<number>" => Ok(TypeTag::NumberArray),
        "object" => Ok(TypeTag::Json),
        _ => Err(UnsupportedType(source_type.trim().to_string())),
    }
}

/// Whether a declared type is function-shaped (an arrow type or the bare
/// `Function` type). These never map to a tag; the extractor and the async
/// transform decide how to report them.
pub fn is_function_type(source_type: &str) -> bool {
    let normalized = normalize(source_type);
    normalized == "Function" || top_level_arrow(&normalized)
}

/// Managed-language spelling of a tag at the public wrapper surface.
pub fn managed_type(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::String => "string",
        TypeTag::Number => "double",
        TypeTag::Boolean => "bool",
        TypeTag::Void => "void",
        TypeTag::StringArray => "string[]",
        TypeTag::NumberArray => "double[]",
        TypeTag::Json => "string",
    }
}

/// Managed-language spelling at the extern (boundary) surface. Booleans
/// travel as ints and arrays/structured values as JSON strings, matching the
/// glue ABI exactly.
pub fn extern_type(tag: TypeTag) -> &'static str {
    match marshal(tag) {
        MarshalStrategy::Verbatim => "double",
        MarshalStrategy::BoolAsInt => "int",
        MarshalStrategy::Utf8String | MarshalStrategy::JsonString => "string",
    }
}

/// Glue-side marshaling strategy for a tag.
pub fn marshal(tag: TypeTag) -> MarshalStrategy {
    match tag {
        TypeTag::String => MarshalStrategy::Utf8String,
        TypeTag::Number => MarshalStrategy::Verbatim,
        TypeTag::Boolean => MarshalStrategy::BoolAsInt,
        // Void never appears as a parameter; as a return it marshals to
        // nothing, which the emitters special-case.
        TypeTag::Void => MarshalStrategy::Verbatim,
        TypeTag::StringArray | TypeTag::NumberArray | TypeTag::Json => MarshalStrategy::JsonString,
    }
}

fn normalize(source_type: &str) -> String {
    let mut out = String::with_capacity(source_type.len());
    let mut last_space = false;
    for ch in source_type.trim().chars() {
        if ch.is_whitespace() {
            last_space = true;
            continue;
        }
        // Keep one space only between two identifier characters, so
        // `Array< string >` and `Array<string>` normalize identically while
        // `() => void` keeps its shape.
        if last_space
            && out
                .chars()
                .last()
                .map(|c| c.is_ascii_alphanumeric())
                .unwrap_or(false)
            && ch.is_ascii_alphanumeric()
        {
            out.push(' ');
        }
        last_space = false;
        out.push(ch);
    }
    out
}

fn top_level_arrow(normalized: &str) -> bool {
    let bytes = normalized.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'<' | b'[' | b'{' => depth += 1,
            b')' | b'>' | b']' | b'}' => {
                // `=>` first: don't count the arrow head as a closer.
                if bytes[i] == b'>' && i > 0 && bytes[i - 1] == b'=' {
                    i += 1;
                    continue;
                }
                depth = depth.saturating_sub(1);
            }
            b'=' if depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b'>' => {
                return true;
            }
            _ => {}
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_primitives() {
        assert_eq!(map_source_type("string"), Ok(TypeTag::String));
        assert_eq!(map_source_type("number"), Ok(TypeTag::Number));
        assert_eq!(map_source_type("boolean"), Ok(TypeTag::Boolean));
        assert_eq!(map_source_type("void"), Ok(TypeTag::Void));
    }

    #[test]
    fn maps_array_spellings() {
        assert_eq!(map_source_type("string[]"), Ok(TypeTag::StringArray));
        assert_eq!(map_source_type("Array<string>"), Ok(TypeTag::StringArray));
        assert_eq!(map_source_type("Array< number >"), Ok(TypeTag::NumberArray));
    }

    #[test]
    fn rejects_unknown_spelling() {
        let err = map_source_type("Date").expect_err("expected unsupported type");
        assert_eq!(err, UnsupportedType("Date".to_string()));
    }

    #[test]
    fn detects_function_shapes() {
        assert!(is_function_type("() => void"));
        assert!(is_function_type("(result: string) => void"));
        assert!(is_function_type("Function"));
        assert!(!is_function_type("string"));
        assert!(!is_function_type("Array<string>"));
    }

    #[test]
    fn extern_types_match_marshal_strategies() {
        assert_eq!(extern_type(TypeTag::Boolean), "int");
        assert_eq!(extern_type(TypeTag::StringArray), "string");
        assert_eq!(extern_type(TypeTag::Number), "double");
    }
}
