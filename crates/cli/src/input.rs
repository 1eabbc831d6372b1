//! File boundary: spreadsheet CSVs, mapping configs and schema documents.
//!
//! Everything that touches the filesystem lives here so the library crates
//! stay pure. Formats are chosen by file extension.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use formlift_core::config::{header_matches, LookupColumns};
use formlift_core::{bind_rows, FormSchema, LookupOption, LookupTable, MappingConfig, RowRecord};

/// Lookup rows whose value starts with this point elsewhere instead of
/// naming an option.
const REFERRAL_PREFIX: &str = "refer to separate";

#[derive(Debug, thiserror::Error)]
pub(crate) enum InputError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid CSV in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("invalid {format} in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
    #[error("{}: missing column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },
}

fn read_text(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn parse_error(path: &Path, format: &'static str, e: impl std::fmt::Display) -> InputError {
    InputError::Parse {
        path: path.to_path_buf(),
        format,
        message: e.to_string(),
    }
}

/// Headers and every record of a CSV file, cells as read.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), InputError> {
    let csv_err = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, records))
}

/// Load a mapping config: `.json` is JSON, anything else is TOML.
pub(crate) fn read_mapping_config(path: &Path) -> Result<MappingConfig, InputError> {
    let text = read_text(path)?;
    if extension(path) == "json" {
        serde_json::from_str(&text).map_err(|e| parse_error(path, "JSON", e))
    } else {
        toml::from_str(&text).map_err(|e| parse_error(path, "TOML", e))
    }
}

pub(crate) fn read_rows(path: &Path, config: &MappingConfig) -> Result<Vec<RowRecord>, InputError> {
    let (headers, records) = read_csv(path)?;
    let rows = bind_rows(&headers, &records, config);
    tracing::debug!(path = %path.display(), rows = rows.len(), "rows read");
    Ok(rows)
}

/// Read a lookup CSV into named option lists.
///
/// Referral rows are skipped, options are deduplicated by value, and a
/// blank label falls back to the value.
pub(crate) fn read_lookups(path: &Path, columns: &LookupColumns) -> Result<LookupTable, InputError> {
    let (headers, records) = read_csv(path)?;
    let position = |configured: &str| headers.iter().position(|h| header_matches(h, configured));
    let missing = |column: &str| InputError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    let type_col = position(&columns.type_column).ok_or_else(|| missing(&columns.type_column))?;
    let value_col =
        position(&columns.value_column).ok_or_else(|| missing(&columns.value_column))?;
    let label_col = position(&columns.label_column);

    let cell = |record: &[String], idx: usize| {
        record.get(idx).map(|c| c.trim().to_string()).unwrap_or_default()
    };

    let mut table: LookupTable = BTreeMap::new();
    for record in &records {
        let name = cell(record, type_col);
        let value = cell(record, value_col);
        if name.is_empty() || value.is_empty() {
            continue;
        }
        if value.to_lowercase().starts_with(REFERRAL_PREFIX) {
            continue;
        }
        let label = label_col
            .map(|idx| cell(record, idx))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| value.clone());
        let options = table.entry(name).or_default();
        if !options.iter().any(|o| o.value == value) {
            options.push(LookupOption { value, label });
        }
    }
    tracing::debug!(path = %path.display(), lookups = table.len(), "lookups read");
    Ok(table)
}

/// Load a schema document written by `convert`: YAML for `.yaml`/`.yml`,
/// JSON otherwise.
pub(crate) fn read_schema(path: &Path) -> Result<FormSchema, InputError> {
    let text = read_text(path)?;
    match extension(path).as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| parse_error(path, "YAML", e)),
        _ => serde_json::from_str(&text).map_err(|e| parse_error(path, "JSON", e)),
    }
}

pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value, InputError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| parse_error(path, "JSON", e))
}
