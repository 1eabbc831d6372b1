use std::path::Path;
use std::process;

use formlift_analyze::{FindingKind, FindingSeverity};

use crate::input::read_schema;
use crate::{fail, OutputFormat};

pub(crate) fn cmd_lint(schema_path: &Path, output: OutputFormat, quiet: bool) {
    let schema = read_schema(schema_path).unwrap_or_else(|e| fail(&e.to_string(), output, quiet));
    let report = formlift_analyze::analyze(&schema);

    if !quiet {
        match output {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
                println!("{}", json);
            }
            OutputFormat::Text => {
                println!("Conditions Report: {}", report.schema_key);
                println!("======================");
                println!();
                println!(
                    "  Fields: {} total, {} with visibility",
                    report.totals.fields, report.totals.with_visibility
                );
                println!("  Dependencies: {} edges", report.totals.edges);
                println!(
                    "  References: {} unresolved",
                    report.count(FindingKind::UnresolvedKey)
                );
                println!(
                    "  Options: {} mismatches, {} suspicious numeric values",
                    report.count(FindingKind::OptionMismatch),
                    report.count(FindingKind::SuspiciousNumericValue)
                );
                println!("  Cycles: {}", report.totals.cycles);

                if !report.findings.is_empty() {
                    println!();
                    println!("Findings:");
                    for finding in &report.findings {
                        let tag = match finding.severity {
                            FindingSeverity::Warning => "WARNING",
                            FindingSeverity::Info => "INFO",
                        };
                        println!("  [{}] {}: {}", finding.analysis, tag, finding.message);
                    }
                }
            }
        }
    }

    if report.has_blocking_findings() {
        process::exit(1);
    }
}
