//! Typed row records, bound once from header-keyed tabular data.

use crate::config::{header_matches, MappingConfig};
use std::collections::BTreeMap;

/// One spreadsheet row. Absent columns read as empty strings; every value is
/// trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    /// 1-based source row number (header row is row 1).
    pub row: u32,
    pub id: String,
    pub label: String,
    pub data_type: String,
    pub field_type: String,
    pub lookup_type: String,
    pub visibility: String,
    pub section: String,
    pub mandatory: String,
    pub help: String,
    pub reference: String,
    pub action: String,
    pub internal: String,
    pub system: String,
    pub complex: String,
    pub complex_identifier: String,
    pub order: String,
    pub stage: String,
    pub regex: String,
    pub field_length: String,
    /// Cells of the columns named in `filters`, keyed by configured header.
    pub filter_cells: BTreeMap<String, String>,
}

impl RowRecord {
    pub fn new(row: u32) -> Self {
        RowRecord {
            row,
            ..RowRecord::default()
        }
    }
}

/// Build typed rows from a header line and raw records.
///
/// Row numbers assume the header occupies row 1. Records whose cells are all
/// blank are skipped.
/// 1-based sheet row of the record at `idx`, after the header row.
/// Saturates instead of wrapping on absurdly long sheets.
fn source_row(idx: usize) -> u32 {
    u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(2)
}

pub fn bind_rows(headers: &[String], records: &[Vec<String>], config: &MappingConfig) -> Vec<RowRecord> {
    let cols = &config.columns;
    let position = |configured: &str| headers.iter().position(|h| header_matches(h, configured));

    let slots = [
        position(&cols.id),
        position(&cols.label),
        position(&cols.data_type),
        position(&cols.field_type),
        position(&cols.lookup_type),
        position(&cols.visibility),
        position(&cols.section),
        position(&cols.mandatory),
        position(&cols.help),
        position(&cols.reference),
        position(&cols.action),
        position(&cols.internal),
        position(&cols.system),
        position(&cols.complex),
        position(&cols.complex_identifier),
        position(&cols.order),
        position(&cols.stage),
        position(&cols.regex),
        position(&cols.field_length),
    ];
    let filter_slots: Vec<(&String, Option<usize>)> = config
        .filters
        .keys()
        .map(|header| (header, position(header)))
        .collect();

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |slot: Option<usize>| -> String {
            slot.and_then(|i| record.get(i))
                .map(|v| v.trim().to_owned())
                .unwrap_or_default()
        };

        let [id, label, data_type, field_type, lookup_type, visibility, section, mandatory, help, reference, action, internal, system, complex, complex_identifier, order, stage, regex, field_length] =
            slots.map(cell);

        let filter_cells = filter_slots
            .iter()
            .map(|(header, slot)| ((*header).clone(), cell(*slot)))
            .collect();

        rows.push(RowRecord {
            row: source_row(idx),
            id,
            label,
            data_type,
            field_type,
            lookup_type,
            visibility,
            section,
            mandatory,
            help,
            reference,
            action,
            internal,
            system,
            complex,
            complex_identifier,
            order,
            stage,
            regex,
            field_length,
            filter_cells,
        });
    }
    rows
}
