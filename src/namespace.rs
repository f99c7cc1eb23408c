//! Namespace Resolution
//!
//! Derives a dotted namespace from a module's logical path beneath the
//! bridge source root. This is a pure function of the path - no file system
//! access, no dependence on traversal order - so resolution stays
//! deterministic and safe to run per-namespace in parallel.
//!
//! Rule: split the relative path into segments, drop the extension from the
//! final segment, convert each segment to a capitalized identifier, join
//! with `.`. `analytics/firebase.ts` resolves to `Analytics.Firebase`.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// An ordered sequence of capitalized namespace segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Dotted form: `Analytics.Firebase`.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Boundary-flattened form: `Analytics_Firebase`.
    pub fn flat(&self) -> String {
        self.segments.join("_")
    }

    /// Final segment, used to name the emitted managed class.
    pub fn leaf(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Resolve a module path (relative to the bridge source root) into its
/// namespace.
pub fn resolve(module_path: &Path) -> Namespace {
    let mut segments = Vec::new();

    let count = module_path.components().count();
    for (idx, component) in module_path.components().enumerate() {
        let raw = component.as_os_str().to_string_lossy();
        let raw = if idx + 1 == count {
            // Final segment: drop the extension.
            match raw.rsplit_once('.') {
                Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
                _ => raw.to_string(),
            }
        } else {
            raw.to_string()
        };
        let segment = capitalize_segment(&raw);
        if !segment.is_empty() {
            segments.push(segment);
        }
    }

    Namespace::from_segments(segments)
}

/// Convert an on-disk segment (kebab-case, snake_case, or camelCase) into a
/// capitalized identifier: `user-prefs` -> `UserPrefs`, `firebase` ->
/// `Firebase`.
fn capitalize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split(['-', '_', '.', ' ']) {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
            None => continue,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn resolves_nested_module_path() {
        let ns = resolve(&PathBuf::from("analytics/firebase.ts"));
        assert_eq!(ns.dotted(), "Analytics.Firebase");
        assert_eq!(ns.flat(), "Analytics_Firebase");
        assert_eq!(ns.leaf(), "Firebase");
    }

    #[test]
    fn resolves_single_segment() {
        let ns = resolve(&PathBuf::from("utils.ts"));
        assert_eq!(ns.dotted(), "Utils");
    }

    #[test]
    fn capitalizes_kebab_and_snake_segments() {
        let ns = resolve(&PathBuf::from("user-prefs/local_store.ts"));
        assert_eq!(ns.dotted(), "UserPrefs.LocalStore");
    }

    #[test]
    fn resolution_is_path_only() {
        // Same path, same namespace - independent of any walk order.
        let a = resolve(&PathBuf::from("social/share.ts"));
        let b = resolve(&PathBuf::from("social/share.ts"));
        assert_eq!(a, b);
    }
}
