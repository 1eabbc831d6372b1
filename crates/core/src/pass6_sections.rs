//! Pass 6: Section hierarchy and field ordering.
//!
//! Sections are grouped by the slug of their title-cased label in
//! encounter order, so section keys are unique. A label
//! whose code (the text before `" - "`) contains a `.` is a subsection of
//! the section whose code is the prefix before the first dot. Top-level
//! sections follow the configured ordering table; unknown codes sort last,
//! ties keep encounter order. The final field list follows the accordion
//! traversal.

use crate::config::{MappingConfig, SectionRules};
use crate::model::{Field, Section};
use crate::text::{slugify, title_case};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Pass 6 output: the accordion tree and the fields in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub accordions: Vec<Section>,
    pub fields: Vec<Field>,
}

struct Group {
    label: String,
    members: Vec<usize>,
}

struct Node {
    label: String,
    code: String,
    encounter: usize,
    fields: Vec<String>,
    subsections: Vec<Section>,
}

pub fn build_sections(mut fields: Vec<Field>, config: &MappingConfig) -> Layout {
    let fallback = title_case(&config.defaults.section);

    // Labels sharing a slug share a section; the first spelling names it.
    let mut groups: Vec<Group> = Vec::new();
    let mut by_slug: HashMap<String, usize> = HashMap::new();
    for (pos, field) in fields.iter_mut().enumerate() {
        let label = match title_case(&field.section) {
            l if l.is_empty() => fallback.clone(),
            l => l,
        };
        let g = *by_slug.entry(slugify(&label)).or_insert_with(|| {
            groups.push(Group {
                label: label.clone(),
                members: Vec::new(),
            });
            groups.len() - 1
        });
        field.section = groups[g].label.clone();
        groups[g].members.push(pos);
    }

    let sorted_keys = |members: &[usize]| -> Vec<String> {
        let mut refs: Vec<&Field> = members.iter().map(|&i| &fields[i]).collect();
        refs.sort_by(|a, b| compare_fields(a, b));
        refs.into_iter().map(|f| f.key.clone()).collect()
    };

    let mut nodes: Vec<Node> = Vec::new();
    let mut subsections: Vec<(usize, &Group)> = Vec::new();
    for (encounter, group) in groups.iter().enumerate() {
        let code = section_code(&group.label);
        if is_subsection_code(code) {
            subsections.push((encounter, group));
            continue;
        }
        nodes.push(Node {
            label: group.label.clone(),
            code: code.to_owned(),
            encounter,
            fields: sorted_keys(&group.members),
            subsections: Vec::new(),
        });
    }

    for (encounter, group) in subsections {
        let code = section_code(&group.label);
        let parent_code = code.split('.').next().unwrap_or(code);
        let parent = match nodes.iter().position(|n| n.code.eq_ignore_ascii_case(parent_code)) {
            Some(p) => p,
            None => {
                let label = config.sections.expand(parent_code);
                tracing::debug!(parent = %label, child = %group.label, "synthesized parent section");
                nodes.push(Node {
                    label,
                    code: parent_code.to_owned(),
                    encounter,
                    fields: Vec::new(),
                    subsections: Vec::new(),
                });
                nodes.len() - 1
            }
        };
        nodes[parent].subsections.push(Section {
            key: slugify(&group.label),
            title: subsection_title(&group.label).to_owned(),
            fields: sorted_keys(&group.members),
            subsections: Vec::new(),
        });
    }

    nodes.sort_by(|a, b| {
        section_rank(&config.sections, &a.code)
            .cmp(&section_rank(&config.sections, &b.code))
            .then(a.encounter.cmp(&b.encounter))
    });

    let accordions: Vec<Section> = nodes
        .into_iter()
        .map(|n| Section {
            key: slugify(&n.label),
            title: n.label,
            fields: n.fields,
            subsections: n.subsections,
        })
        .collect();

    let ordered = traversal_order(&accordions);
    let rank: HashMap<&str, usize> = ordered.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut indexed: Vec<(usize, Field)> = fields
        .into_iter()
        .map(|f| (rank.get(f.key.as_str()).copied().unwrap_or(usize::MAX), f))
        .collect();
    indexed.sort_by_key(|(r, _)| *r);
    let fields = indexed.into_iter().map(|(_, f)| f).collect();

    Layout { accordions, fields }
}

/// Four-tier field order: unconditional before conditional, ordered
/// before unordered; then by order value, then by key.
pub fn compare_fields(a: &Field, b: &Field) -> Ordering {
    tier(a)
        .cmp(&tier(b))
        .then_with(|| match (a.order, b.order) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.key.cmp(&b.key))
}

fn tier(f: &Field) -> u8 {
    match (f.is_conditional(), f.order.is_some()) {
        (false, true) => 0,
        (false, false) => 1,
        (true, true) => 2,
        (true, false) => 3,
    }
}

/// Text before the first `" - "`, or the whole label.
pub fn section_code(label: &str) -> &str {
    label.split(" - ").next().unwrap_or(label).trim()
}

fn is_subsection_code(code: &str) -> bool {
    code.contains('.') && !code.contains(char::is_whitespace)
}

fn subsection_title(label: &str) -> &str {
    let parts: Vec<&str> = label.split(" - ").collect();
    match parts.len() {
        n if n >= 3 => parts[2],
        2 => parts[1],
        _ => label,
    }
}

fn section_rank(rules: &SectionRules, code: &str) -> usize {
    rules.rank(code).unwrap_or(usize::MAX)
}

fn traversal_order(accordions: &[Section]) -> Vec<&str> {
    accordions.iter().flat_map(Section::all_field_keys).collect()
}
