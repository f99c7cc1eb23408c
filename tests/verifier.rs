//! Verifier checks against arbitrary artifact text, independent of any
//! generation run - the way a build step would use it on stale or
//! hand-edited output.

use bridgegen::pipeline::{self, SourceModule};
use bridgegen::verify::{self, InvariantViolation, Side};
use std::path::PathBuf;

fn emitted_pair() -> (String, String) {
    let modules = vec![SourceModule {
        path: PathBuf::from("analytics/firebase.ts"),
        source: r#"
export function setUserId(id: string): void {}
export async function logEvent(name: string, value: number): Promise<void> {}
"#
        .to_string(),
    }];
    let output = pipeline::generate_modules(&modules);
    let pair = &output.pairs[0];
    (pair.managed.text.clone(), pair.glue.text.clone())
}

#[test]
fn clean_pair_has_no_findings() {
    let (managed, glue) = emitted_pair();
    assert_eq!(verify::verify_units(&managed, &glue), vec![]);
}

#[test]
fn extra_glue_function_is_missing_managed_counterpart() {
    let (managed, glue) = emitted_pair();
    let tampered = glue.replace(
        "mergeInto(LibraryManager.library, {\n",
        "mergeInto(LibraryManager.library, {\n  Analytics_Firebase_orphan: function (x) {\n  },\n",
    );

    let violations = verify::verify_units(&managed, &tampered);
    assert_eq!(
        violations,
        vec![InvariantViolation::MissingCounterpart {
            identifier: "Analytics_Firebase_orphan".to_string(),
            missing_from: Side::Managed,
        }]
    );
}

#[test]
fn reordered_extern_callback_is_flagged_on_the_managed_side() {
    let (managed, glue) = emitted_pair();
    let tampered = managed.replace(
        "(string name, double value, int callbackId)",
        "(string name, int callbackId, double value)",
    );

    let violations = verify::verify_units(&tampered, &glue);
    assert!(violations.contains(&InvariantViolation::CallbackPositionMismatch {
        identifier: "Analytics_Firebase_logEvent".to_string(),
        side: Side::Managed,
    }));
}

#[test]
fn removed_completion_site_is_a_pattern_violation() {
    let (managed, glue) = emitted_pair();
    let tampered: String = glue
        .lines()
        .filter(|l| !l.contains("SendMessage("))
        .collect::<Vec<_>>()
        .join("\n");

    let violations = verify::verify_units(&managed, &tampered);
    assert!(violations.contains(&InvariantViolation::CompletionPatternViolation {
        identifier: "Analytics_Firebase_logEvent".to_string(),
        count: 0,
    }));
}

#[test]
fn stale_managed_artifact_is_caught() {
    // Simulate a source edit that regenerated only the glue side: the
    // managed artifact still carries the old two-parameter extern.
    let modules = vec![SourceModule {
        path: PathBuf::from("analytics/firebase.ts"),
        source: "export async function logEvent(name: string): Promise<void> {}\n".to_string(),
    }];
    let stale = pipeline::generate_modules(&modules);
    let stale_managed = stale.pairs[0].managed.text.clone();

    let (_, fresh_glue) = emitted_pair();

    let violations = verify::verify_units(&stale_managed, &fresh_glue);
    assert!(violations.iter().any(|v| matches!(
        v,
        InvariantViolation::MissingCounterpart { .. } | InvariantViolation::ArityMismatch { .. }
    )));
}
