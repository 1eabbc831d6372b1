//! Pass 5: Value canonicalization -- rewrite condition values to the
//! canonical option of the lookup/enum field they reference.
//!
//! Two phases: the option snapshot is built from the complete field set
//! first, then conditions are rewritten against that read-only snapshot.

use crate::model::{Field, LookupOption};
use std::collections::{BTreeMap, HashMap};

/// Read-only snapshot of option sets, keyed by field key. Only lookup and
/// enum fields contribute.
#[derive(Debug, Clone, Default)]
pub struct OptionSets {
    by_key: HashMap<String, Vec<LookupOption>>,
}

impl OptionSets {
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Self {
        let by_key = fields
            .into_iter()
            .filter(|f| f.has_options())
            .map(|f| (f.key.clone(), f.options.clone()))
            .collect();
        OptionSets { by_key }
    }

    pub fn get(&self, key: &str) -> Option<&[LookupOption]> {
        self.by_key.get(key).map(Vec::as_slice)
    }
}

/// The canonical spelling of `raw` among `options`, or `None` to leave it.
///
/// A value already equal to an option's canonical spelling is left alone,
/// which makes rewriting idempotent.
pub fn canonical_value(
    raw: &str,
    options: &[LookupOption],
    aliases: &BTreeMap<String, String>,
) -> Option<String> {
    if raw.is_empty() || options.iter().any(|o| o.canonical().trim() == raw) {
        return None;
    }
    let lowered = raw.trim().to_lowercase();
    let wanted = aliases.get(&lowered).unwrap_or(&lowered);
    options
        .iter()
        .find(|o| o.value.trim().to_lowercase() == *wanted || o.label.trim().to_lowercase() == *wanted)
        .map(|o| o.canonical().trim().to_owned())
        .filter(|canon| canon != raw)
}

/// Rewrite every condition in `fields`. Returns how many values changed.
pub fn canonicalize(fields: &mut [Field], aliases: &BTreeMap<String, String>) -> usize {
    let snapshot = OptionSets::from_fields(fields.iter());
    let mut changed = 0;
    for field in fields.iter_mut() {
        for cond in field.visibility.conditions_mut() {
            let Some(options) = snapshot.get(&cond.source_key) else {
                continue;
            };
            if let Some(canon) = canonical_value(&cond.value, options, aliases) {
                tracing::debug!(
                    field = %field.key,
                    controller = %cond.source_key,
                    from = %cond.value,
                    to = %canon,
                    "canonicalized condition value"
                );
                cond.value = canon;
                changed += 1;
            }
        }
    }
    changed
}
