use std::path::Path;
use std::process;

use formlift_core::{FormSchema, LookupTable, RunSummary};

use crate::input::{read_lookups, read_mapping_config, read_rows};
use crate::{fail, DocumentFormat, OutputFormat};

pub(crate) struct ConvertArgs<'a> {
    pub rows: &'a Path,
    pub config: &'a Path,
    pub lookups: Option<&'a Path>,
    pub out: Option<&'a Path>,
    pub format: DocumentFormat,
    pub summary: Option<&'a Path>,
}

fn render(schema: &FormSchema, format: DocumentFormat) -> Result<String, String> {
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(schema).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::to_string_pretty(schema)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
    }
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{} rows: {} fields, {} excluded, {} conditional, {} unresolved lookups, {} unsupported expressions",
        summary.rows_seen,
        summary.included,
        summary.excluded,
        summary.fields_with_visibility,
        summary.unresolved_lookups.len(),
        summary.unsupported_expressions.len()
    )
}

pub(crate) fn cmd_convert(args: &ConvertArgs<'_>, output: OutputFormat, quiet: bool) {
    // Step 1: Read inputs
    let config =
        read_mapping_config(args.config).unwrap_or_else(|e| fail(&e.to_string(), output, quiet));
    let rows =
        read_rows(args.rows, &config).unwrap_or_else(|e| fail(&e.to_string(), output, quiet));
    let lookups = match args.lookups {
        Some(path) => read_lookups(path, &config.lookups)
            .unwrap_or_else(|e| fail(&e.to_string(), output, quiet)),
        None => LookupTable::new(),
    };

    // Step 2: Assemble; a fatal error leaves every output untouched
    let assembly = match formlift_core::assemble(&rows, &lookups, &config) {
        Ok(a) => a,
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let err_json = serde_json::to_string_pretty(&e.to_json_value())
                        .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", e));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("conversion error: {}", e);
                    }
                }
            }
            process::exit(1);
        }
    };

    // Step 3: Serialize everything before writing anything
    let document = render(&assembly.schema, args.format)
        .unwrap_or_else(|e| fail(&format!("serialization error: {}", e), output, quiet));
    let summary_json = serde_json::to_string_pretty(&assembly.summary.to_json_value())
        .unwrap_or_else(|e| fail(&format!("serialization error: {}", e), output, quiet));

    // Step 4: Write
    match args.out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &document) {
                fail(&format!("cannot write {}: {}", path.display(), e), output, quiet);
            }
        }
        None => print!("{}", document),
    }
    if let Some(path) = args.summary {
        if let Err(e) = std::fs::write(path, format!("{}\n", summary_json)) {
            fail(&format!("cannot write {}: {}", path.display(), e), output, quiet);
        }
    }

    // Step 5: Report. With no --out the document owns stdout.
    if quiet {
        return;
    }
    match (args.out, output) {
        (Some(path), OutputFormat::Json) => {
            let report = serde_json::json!({
                "out": path.display().to_string(),
                "summary": assembly.summary.to_json_value(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
            );
        }
        (Some(path), OutputFormat::Text) => {
            println!("wrote {}", path.display());
            println!("{}", summary_line(&assembly.summary));
        }
        (None, _) => eprintln!("{}", summary_line(&assembly.summary)),
    }
}
