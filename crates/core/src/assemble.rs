//! Six-pass assembly: typed rows + lookups + mapping -> form schema.
//!
//! A thin orchestrator calling each pass in order. Passes 1-4 build the
//! field set; pass 5 rewrites it against a frozen snapshot; pass 6 lays it
//! out. A fatal error returns before any schema exists.

use crate::config::MappingConfig;
use crate::error::ConvertError;
use crate::model::{FormSchema, LookupTable};
use crate::pass1_rows;
use crate::pass2_index;
use crate::pass3_groups;
use crate::pass4_overrides;
use crate::pass5_canonicalize;
use crate::pass6_sections;
use crate::rows::RowRecord;
use crate::summary::RunSummary;

/// A successful run: the schema and what happened along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub schema: FormSchema,
    pub summary: RunSummary,
}

pub fn assemble(
    rows: &[RowRecord],
    lookups: &LookupTable,
    config: &MappingConfig,
) -> Result<Assembly, ConvertError> {
    let mut summary = RunSummary::default();

    // Pass 1: row intake
    let intake = pass1_rows::intake_rows(rows, lookups, config, &mut summary);
    let mut staged = intake.fields;

    // Pass 2: key index, duplicate keys are fatal
    let mut index = pass2_index::build_index(&staged)?;

    // Pass 3: complex groups
    pass3_groups::resolve_groups(
        &mut staged,
        &intake.groups,
        &mut index,
        &config.defaults.section,
        &mut summary,
    )?;

    // Pass 4: configured visibility overrides
    pass4_overrides::apply_overrides(
        &mut staged,
        &config.visibility_overrides,
        &index,
        &config.operator_table(),
        &mut summary,
    );

    // Pass 5: canonicalize condition values
    let mut fields: Vec<_> = staged.into_iter().map(|s| s.field).collect();
    let changed = pass5_canonicalize::canonicalize(&mut fields, &config.alias_table());
    tracing::debug!(changed, "canonicalized condition values");

    // Pass 6: sections and ordering
    let layout = pass6_sections::build_sections(fields, config);

    summary.fields_with_visibility = layout.fields.iter().filter(|f| f.is_conditional()).count();

    let entity = config
        .schema
        .entity
        .clone()
        .unwrap_or_else(|| config.defaults.entity.clone());
    let schema = FormSchema {
        key: config.schema.key.clone(),
        name: config.schema.name.clone(),
        version: config.schema.version.clone(),
        entity,
        fields: layout.fields,
        accordions: layout.accordions,
        groups: intake.groups,
    };

    tracing::info!(
        rows = summary.rows_seen,
        included = summary.included,
        excluded = summary.excluded,
        unresolved_lookups = summary.unresolved_lookups.len(),
        unsupported_expressions = summary.unsupported_expressions.len(),
        "assembled form schema"
    );

    Ok(Assembly { schema, summary })
}
