//! Integration tests for the C1-C3 conditions report.
//!
//! These tests assemble small forms from legacy rows through formlift-core,
//! then run the full analysis suite and verify the results.

use formlift_analyze::{analyze, analyze_json, FindingKind, FindingSeverity};
use formlift_core::{assemble, bind_rows, FormSchema, LookupOption, LookupTable, MappingConfig};

/// Assemble rows of `[key, label, data type, lookup, visibility]`.
fn assemble_rows(records: &[[&str; 5]]) -> FormSchema {
    let cfg = MappingConfig::default();
    let headers: Vec<String> = ["KEYNAME", "LABEL", "DATA TYPE", "LOOKUP", "VISIBILITY CONDITION"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let records: Vec<Vec<String>> = records
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    let rows = bind_rows(&headers, &records, &cfg);

    let mut lookups = LookupTable::new();
    lookups.insert(
        "YesNo".into(),
        vec![LookupOption::same("Yes"), LookupOption::same("No")],
    );
    lookups.insert(
        "Countries".into(),
        vec![
            LookupOption {
                value: "LU".into(),
                label: "Luxembourg".into(),
            },
            LookupOption {
                value: "FR".into(),
                label: "France".into(),
            },
        ],
    );
    assemble(&rows, &lookups, &cfg)
        .unwrap_or_else(|e| panic!("assembly failed: {}", e))
        .schema
}

// ──────────────────────────────────────────────
// Clean forms
// ──────────────────────────────────────────────

#[test]
fn canonicalized_form_is_clean() {
    let schema = assemble_rows(&[
        ["Regulated", "Regulated?", "Lookup", "YesNo", ""],
        ["Regulator", "Regulator", "Text", "", "Regulated = 'y'"],
        ["Country", "Country", "Lookup", "Countries", ""],
        ["TaxId", "Tax id", "Text", "", "Country = 'luxembourg' OR 'france'"],
    ]);
    let report = analyze(&schema);

    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert_eq!(report.totals.fields, 4);
    assert_eq!(report.totals.with_visibility, 2);
    assert_eq!(report.totals.edges, 2);
    assert_eq!(report.totals.cycles, 0);
}

// ──────────────────────────────────────────────
// C1 / C2 — References and options
// ──────────────────────────────────────────────

#[test]
fn unresolved_controller_is_reported() {
    let schema = assemble_rows(&[
        ["Name", "Name", "Text", "", "Ghost = 'x'"],
    ]);
    let report = analyze(&schema);

    assert_eq!(report.count(FindingKind::UnresolvedKey), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.analysis, "c1");
    assert_eq!(finding.severity, FindingSeverity::Warning);
    assert_eq!(finding.field_key.as_deref(), Some("Name"));
    assert!(report.has_blocking_findings());
}

#[test]
fn value_outside_the_option_set_is_reported() {
    let schema = assemble_rows(&[
        ["Country", "Country", "Lookup", "Countries", ""],
        ["Vat", "VAT number", "Text", "", "Country = 'Germany'"],
        ["Code", "Code", "Text", "", "Country = '2'"],
    ]);
    let report = analyze(&schema);

    assert_eq!(report.count(FindingKind::OptionMismatch), 2);
    assert_eq!(report.count(FindingKind::SuspiciousNumericValue), 1);
    assert!(!report.has_blocking_findings());

    let numeric = report
        .findings
        .iter()
        .find(|f| f.kind == FindingKind::SuspiciousNumericValue)
        .unwrap();
    assert_eq!(numeric.severity, FindingSeverity::Info);
    assert_eq!(numeric.field_key.as_deref(), Some("Code"));
}

// ──────────────────────────────────────────────
// C3 — Cycles
// ──────────────────────────────────────────────

#[test]
fn mutual_dependency_is_a_cycle() {
    let schema = assemble_rows(&[
        ["First", "First", "Text", "", "Second = 'a'"],
        ["Second", "Second", "Text", "", "First = 'b'"],
        ["Third", "Third", "Text", "", "Second = 'c'"],
    ]);
    let report = analyze(&schema);

    assert_eq!(report.totals.cycles, 1);
    let cycle = report
        .findings
        .iter()
        .find(|f| f.kind == FindingKind::Cycle)
        .unwrap();
    assert_eq!(cycle.message, "Visibility cycle: First -> Second -> First");
    assert!(report.has_blocking_findings());
}

// ──────────────────────────────────────────────
// Serialized documents
// ──────────────────────────────────────────────

#[test]
fn written_document_analyzes_like_the_in_memory_schema() {
    let schema = assemble_rows(&[
        ["Country", "Country", "Lookup", "Countries", ""],
        ["Vat", "VAT number", "Text", "", "Country = 'Germany' OR Missing = 'x'"],
    ]);
    let doc = serde_json::to_value(&schema).unwrap();
    let from_doc = analyze_json(&doc).unwrap();
    let in_memory = analyze(&schema);

    assert_eq!(from_doc.totals, in_memory.totals);
    assert_eq!(from_doc.count(FindingKind::UnresolvedKey), 1);
    assert_eq!(from_doc.count(FindingKind::OptionMismatch), 1);
}

#[test]
fn report_serializes_with_findings_and_totals() {
    let schema = assemble_rows(&[["Name", "Name", "Text", "", "Ghost = 'x'"]]);
    let json = serde_json::to_value(analyze(&schema)).unwrap();

    assert_eq!(json["analyses_run"], serde_json::json!(["c1", "c2", "c3"]));
    assert_eq!(json["findings"][0]["kind"], "unresolved_key");
    assert_eq!(json["totals"]["findings"], 1);
}
