//! C1 — Condition references.
//!
//! Every condition names a controller by `sourceKey`. Resolved references
//! become controller -> dependent edges; unresolved ones are reported.

use formlift_core::FormSchema;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// A condition whose `sourceKey` names no field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub field: String,
    pub source_key: String,
}

/// Aggregated C1 result.
#[derive(Debug, Clone, Serialize)]
pub struct C1Result {
    /// Unique (controller, dependent) pairs, sorted.
    pub edges: BTreeSet<(String, String)>,
    pub unresolved: Vec<UnresolvedReference>,
}

pub fn analyze_references(schema: &FormSchema) -> C1Result {
    let keys: HashSet<&str> = schema.fields.iter().map(|f| f.key.as_str()).collect();
    let mut edges = BTreeSet::new();
    let mut unresolved = Vec::new();

    for field in &schema.fields {
        for cond in field.visibility.conditions() {
            if keys.contains(cond.source_key.as_str()) {
                edges.insert((cond.source_key.clone(), field.key.clone()));
            } else {
                let r = UnresolvedReference {
                    field: field.key.clone(),
                    source_key: cond.source_key.clone(),
                };
                if !unresolved.contains(&r) {
                    unresolved.push(r);
                }
            }
        }
    }

    C1Result { edges, unresolved }
}
