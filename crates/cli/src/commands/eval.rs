use std::path::Path;

use crate::input::{read_json, read_schema};
use crate::{fail, OutputFormat};

pub(crate) fn cmd_eval(schema_path: &Path, answers_path: &Path, output: OutputFormat, quiet: bool) {
    let schema = read_schema(schema_path).unwrap_or_else(|e| fail(&e.to_string(), output, quiet));
    let answers = read_json(answers_path).unwrap_or_else(|e| fail(&e.to_string(), output, quiet));

    let visible = formlift_eval::evaluate(&schema, &answers)
        .unwrap_or_else(|e| fail(&format!("evaluation error: {}", e), output, quiet));

    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "visible": visible,
                "hidden": schema.fields.len() - visible.len(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
            );
        }
        OutputFormat::Text => {
            for key in &visible {
                println!("{}", key);
            }
        }
    }
}
