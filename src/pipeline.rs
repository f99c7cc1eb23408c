//! Generation Pipeline
//!
//! The single entry point the build tooling calls: collect source modules,
//! extract, transform, emit both artifacts per namespace, verify each
//! emitted pair, and assemble the [`GenerationReport`].
//!
//! Fault isolation: an error in one module aborts its namespace only.
//! Every other namespace still extracts, emits, and verifies, which bounds
//! the blast radius of one malformed source file to the functions that
//! live next to it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::emit::{self, EmittedPair};
use crate::error::GenerateError;
use crate::extract;
use crate::namespace::{self, Namespace};
use crate::report::{GenerationReport, NamespaceOutcome, ReportedViolation};
use crate::transform;
use crate::types::BridgeFunctionDescriptor;
use crate::verify;

/// One source module: logical path beneath the bridge root, plus its text.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub path: PathBuf,
    pub source: String,
}

/// Where the two artifact kinds are written. A `None` directory means that
/// artifact kind is produced in memory only (check mode).
#[derive(Debug, Clone, Default)]
pub struct OutputTargets {
    pub managed_dir: Option<PathBuf>,
    pub glue_dir: Option<PathBuf>,
}

/// Everything one run produces: the report plus the emitted pairs for
/// namespaces that generated cleanly.
#[derive(Debug)]
pub struct GenerationOutput {
    pub report: GenerationReport,
    pub pairs: Vec<EmittedPair>,
}

/// Generate from a source tree on disk, writing artifacts to `targets`.
pub fn generate(
    source_root: &Path,
    targets: &OutputTargets,
) -> Result<GenerationOutput, GenerateError> {
    let modules = collect_modules(source_root)?;
    let output = generate_modules(&modules);

    for pair in &output.pairs {
        if let Some(dir) = &targets.managed_dir {
            write_unit(dir, &pair.managed.file_name, &pair.managed.text)?;
        }
        if let Some(dir) = &targets.glue_dir {
            write_unit(dir, &pair.glue.file_name, &pair.glue.text)?;
        }
    }

    Ok(output)
}

/// Collect bridge source modules beneath `source_root`, sorted by relative
/// path so the pipeline's output never depends on directory enumeration
/// order.
pub fn collect_modules(source_root: &Path) -> Result<Vec<SourceModule>, GenerateError> {
    let mut paths = Vec::new();
    walk(source_root, source_root, &mut paths)?;
    paths.sort();

    let mut modules = Vec::with_capacity(paths.len());
    for relative in paths {
        let absolute = source_root.join(&relative);
        let source = fs::read_to_string(&absolute).map_err(|source| GenerateError::Io {
            path: absolute.clone(),
            source,
        })?;
        modules.push(SourceModule {
            path: relative,
            source,
        });
    }
    Ok(modules)
}

/// Run the full pipeline over already-loaded modules. Pure with respect to
/// the file system; the disk-facing `generate` wraps this.
pub fn generate_modules(modules: &[SourceModule]) -> GenerationOutput {
    let mut by_namespace: BTreeMap<Namespace, Vec<BridgeFunctionDescriptor>> = BTreeMap::new();
    let mut failures: BTreeMap<Namespace, GenerateError> = BTreeMap::new();
    let mut seen: BTreeMap<(String, String), PathBuf> = BTreeMap::new();
    let mut skips = Vec::new();

    for module in modules {
        let ns = namespace::resolve(&module.path);
        if failures.contains_key(&ns) {
            debug!(namespace = %ns, file = %module.path.display(), "namespace already failed, skipping module");
            continue;
        }

        let extraction = match extract::extract_module(&module.path, &module.source, &ns) {
            Ok(extraction) => extraction,
            Err(err) => {
                failures.insert(ns, err);
                continue;
            }
        };
        skips.extend(extraction.skips);

        for descriptor in extraction.descriptors {
            let key = (ns.dotted(), descriptor.name.clone());
            if let Some(first) = seen.get(&key) {
                failures.insert(
                    ns.clone(),
                    GenerateError::DuplicateBinding {
                        namespace: key.0,
                        function: key.1,
                        first: first.clone(),
                        second: module.path.clone(),
                    },
                );
                break;
            }
            seen.insert(key, module.path.clone());

            match transform::transform(&module.path, descriptor) {
                Ok(transformed) => {
                    by_namespace.entry(ns.clone()).or_default().push(transformed);
                }
                Err(err) => {
                    failures.insert(ns.clone(), err);
                    break;
                }
            }
        }
    }

    // A namespace that failed anywhere contributes nothing to either
    // artifact, even if some of its modules extracted cleanly.
    for ns in failures.keys() {
        by_namespace.remove(ns);
    }

    let mut outcomes: BTreeMap<String, NamespaceOutcome> = BTreeMap::new();
    let mut pairs = Vec::new();

    for (ns, descriptors) in &by_namespace {
        let pair = emit::emit_namespace(ns, descriptors);
        let violations = verify::verify_units(&pair.managed.text, &pair.glue.text);

        let mut outcome = NamespaceOutcome::emitted(
            ns.dotted(),
            descriptors
                .iter()
                .map(BridgeFunctionDescriptor::boundary_identifier)
                .collect(),
        );
        outcome.violations = violations.iter().map(ReportedViolation::from).collect();

        info!(
            namespace = %ns,
            functions = outcome.functions.len(),
            violations = outcome.violations.len(),
            "emitted namespace"
        );
        outcomes.insert(ns.dotted(), outcome);
        pairs.push(pair);
    }

    for (ns, err) in &failures {
        info!(namespace = %ns, error = %err, "namespace failed");
        outcomes.insert(ns.dotted(), NamespaceOutcome::failed(ns.dotted(), err));
    }

    GenerationOutput {
        report: GenerationReport {
            namespaces: outcomes.into_values().collect(),
            skips,
        },
        pairs,
    }
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), GenerateError> {
    let entries = fs::read_dir(dir).map_err(|source| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| GenerateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if is_bridge_module(&path) {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_path_buf();
            out.push(relative);
        }
    }
    Ok(())
}

fn is_bridge_module(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".ts") && !name.ends_with(".d.ts")
}

fn write_unit(dir: &Path, file_name: &str, text: &str) -> Result<(), GenerateError> {
    fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    fs::write(&path, text).map_err(|source| GenerateError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, source: &str) -> SourceModule {
        SourceModule {
            path: PathBuf::from(path),
            source: source.to_string(),
        }
    }

    #[test]
    fn emits_one_pair_per_namespace() {
        let modules = vec![
            module(
                "analytics/firebase.ts",
                "export async function logEvent(name: string, value: number): Promise<void> {}\n",
            ),
            module(
                "utils.ts",
                "export function log(message: string): void {}\n",
            ),
        ];

        let output = generate_modules(&modules);
        assert!(!output.report.has_errors());
        assert_eq!(output.pairs.len(), 2);
        assert_eq!(output.report.namespaces.len(), 2);
    }

    #[test]
    fn one_bad_module_leaves_other_namespaces_intact() {
        let modules = vec![
            module(
                "analytics/firebase.ts",
                "export function track(when: Date): void {}\n",
            ),
            module(
                "utils.ts",
                "export function log(message: string): void {}\n",
            ),
        ];

        let output = generate_modules(&modules);
        assert!(output.report.has_errors());
        assert_eq!(output.pairs.len(), 1);
        assert_eq!(output.pairs[0].namespace.dotted(), "Utils");

        let failed = output
            .report
            .namespaces
            .iter()
            .find(|ns| ns.namespace == "Analytics.Firebase")
            .expect("failed namespace");
        let error = failed.error.as_ref().expect("error");
        assert_eq!(error.kind, "UnsupportedType");
        assert_eq!(error.symbol.as_deref(), Some("track"));
    }

    #[test]
    fn duplicate_binding_suppresses_the_namespace() {
        // `utils.ts` and `Utils.ts` both resolve to namespace `Utils`.
        let modules = vec![
            module("utils.ts", "export function log(message: string): void {}\n"),
            module("Utils.ts", "export function log(level: number): void {}\n"),
        ];

        let output = generate_modules(&modules);
        assert!(output.report.has_errors());
        assert!(output.pairs.is_empty());

        let failed = &output.report.namespaces[0];
        let error = failed.error.as_ref().expect("error");
        assert_eq!(error.kind, "DuplicateBinding");
        assert!(error.message.contains("utils.ts"));
        assert!(error.message.contains("Utils.ts"));
    }
}
