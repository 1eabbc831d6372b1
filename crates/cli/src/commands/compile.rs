use std::path::Path;

use formlift_core::{compile_visibility_audited, OperatorTable};

use crate::input::read_mapping_config;
use crate::{fail, OutputFormat};

pub(crate) fn cmd_compile(
    expression: &str,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let operators = match config_path {
        Some(path) => read_mapping_config(path)
            .unwrap_or_else(|e| fail(&e.to_string(), output, quiet))
            .operator_table(),
        None => OperatorTable::default(),
    };

    let compiled = compile_visibility_audited(expression, &operators)
        .unwrap_or_else(|e| fail(&format!("compile error: {}", e), output, quiet));

    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "rules": compiled.expression,
                "dropped": compiled.dropped,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
            );
        }
        OutputFormat::Text => {
            let rules = serde_json::to_string_pretty(&compiled.expression)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", rules);
            if !quiet {
                for d in &compiled.dropped {
                    eprintln!("dropped {}: {}", d.reason.as_str(), d.fragment);
                }
            }
        }
    }
}
