//! bridgegen CLI - generate and verify bridge binding artifacts
//!
//! Commands:
//!   bridgegen generate <source-root> --managed-out <dir> --glue-out <dir>
//!   bridgegen verify <managed-file> <glue-file>

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bridgegen::pipeline::{self, OutputTargets};
use bridgegen::report::GenerationReport;
use bridgegen::verify;

#[derive(Parser)]
#[command(name = "bridgegen")]
#[command(about = "Dual-artifact bridge binding generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate managed and glue units from a bridge source tree
    Generate {
        /// Root directory of the bridge source modules
        source_root: PathBuf,

        /// Directory for managed binding units
        #[arg(long)]
        managed_out: Option<PathBuf>,

        /// Directory for glue library units
        #[arg(long)]
        glue_out: Option<PathBuf>,

        /// Generate in memory only; write nothing
        #[arg(long)]
        check: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify a previously generated (or hand-edited) artifact pair
    Verify {
        /// Managed binding unit
        managed_file: PathBuf,

        /// Glue library unit
        glue_file: PathBuf,

        /// Output findings as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            source_root,
            managed_out,
            glue_out,
            check,
            json,
        } => {
            let targets = if check {
                OutputTargets::default()
            } else {
                OutputTargets {
                    managed_dir: managed_out,
                    glue_dir: glue_out,
                }
            };
            let output = pipeline::generate(&source_root, &targets)?;
            print_report(&output.report, json)?;
            Ok(exit_code(output.report.has_errors()))
        }
        Commands::Verify {
            managed_file,
            glue_file,
            json,
        } => {
            let managed = std::fs::read_to_string(&managed_file)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", managed_file.display(), e))?;
            let glue = std::fs::read_to_string(&glue_file)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", glue_file.display(), e))?;

            let violations = verify::verify_units(&managed, &glue);
            if json {
                let findings = violations
                    .iter()
                    .map(|v| {
                        serde_json::json!({
                            "kind": v.kind(),
                            "message": v.to_string(),
                        })
                    })
                    .collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&findings)?);
            } else if violations.is_empty() {
                println!("ok: artifacts agree on the boundary convention");
            } else {
                for violation in &violations {
                    println!("{}: {}", violation.kind(), violation);
                }
            }
            Ok(exit_code(!violations.is_empty()))
        }
    }
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_report(report: &GenerationReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for outcome in &report.namespaces {
        match &outcome.error {
            Some(error) => {
                let file = error
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let symbol = error.symbol.as_deref().unwrap_or("<module>");
                println!(
                    "FAIL {}: {} ({} in {})",
                    outcome.namespace, error.kind, symbol, file
                );
                println!("     {}", error.message);
            }
            None => {
                println!(
                    "ok   {} ({} function{})",
                    outcome.namespace,
                    outcome.functions.len(),
                    if outcome.functions.len() == 1 { "" } else { "s" }
                );
            }
        }
        for violation in &outcome.violations {
            println!("VIOLATION {}: {}", violation.kind, violation.message);
        }
    }

    for skip in &report.skips {
        println!(
            "skip {} '{}' ({:?})",
            skip.file.display(),
            skip.symbol,
            skip.reason
        );
    }

    if report.has_errors() {
        println!("{} error(s); artifacts for failed namespaces were not emitted", report.error_count());
    }
    Ok(())
}
