//! Pass 3: Complex-group resolution -- promote an existing field to
//! `complex`, or synthesize a parent field that inherits its section from
//! the first child.

use crate::error::ConvertError;
use crate::model::{ComplexGroup, Field, FieldStyle, FieldType};
use crate::pass1_rows::StagedField;
use crate::pass2_index::Index;
use crate::summary::RunSummary;

pub fn resolve_groups(
    fields: &mut Vec<StagedField>,
    groups: &[ComplexGroup],
    index: &mut Index,
    default_section: &str,
    summary: &mut RunSummary,
) -> Result<(), ConvertError> {
    for group in groups {
        if let Some(pos) = index.position(&group.key) {
            let parent = &mut fields[pos].field;
            parent.field_type = Some(FieldType::Complex);
            parent.children = group.children.clone();
            if group.title_field.is_some() {
                parent.title_field = group.title_field.clone();
            }
            summary.promoted_groups.push(group.key.clone());
            continue;
        }

        let first_child = group
            .children
            .iter()
            .find_map(|child| index.position(child))
            .map(|pos| &fields[pos]);
        let section = first_child
            .map(|s| s.field.section.clone())
            .unwrap_or_else(|| default_section.to_owned());
        let row = first_child.map(|s| s.row).unwrap_or(0);

        let mut parent = Field::new(group.key.as_str(), group.key.as_str(), FieldStyle::Field);
        parent.field_type = Some(FieldType::Complex);
        parent.children = group.children.clone();
        parent.title_field = group.title_field.clone();
        parent.section = section;
        parent.script_id = Some(format!("GROUP:{}", group.key));

        index.insert(&group.key, fields.len())?;
        tracing::debug!(key = %group.key, children = group.children.len(), "synthesized group parent");
        fields.push(StagedField { field: parent, row });
        summary.synthesized_groups.push(group.key.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass2_index::build_index;

    fn staged(key: &str, section: &str, row: u32) -> StagedField {
        let mut field = Field::new(key, key, FieldStyle::Field);
        field.field_type = Some(FieldType::String);
        field.section = section.into();
        StagedField { field, row }
    }

    fn group(key: &str, children: &[&str], title: Option<&str>) -> ComplexGroup {
        ComplexGroup {
            key: key.into(),
            children: children.iter().map(|c| c.to_string()).collect(),
            title_field: title.map(str::to_owned),
        }
    }

    #[test]
    fn existing_field_is_promoted() {
        let mut fields = vec![staged("ADDR", "Contact", 2), staged("STREET", "Contact", 3)];
        let mut idx = build_index(&fields).unwrap();
        let mut summary = RunSummary::default();
        let groups = vec![group("ADDR", &["STREET"], Some("STREET"))];
        resolve_groups(&mut fields, &groups, &mut idx, "General", &mut summary).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field.field_type, Some(FieldType::Complex));
        assert_eq!(fields[0].field.children, vec!["STREET"]);
        assert_eq!(fields[0].field.title_field.as_deref(), Some("STREET"));
        assert_eq!(summary.promoted_groups, vec!["ADDR"]);
    }

    #[test]
    fn missing_parent_is_synthesized_in_first_child_section() {
        let mut fields = vec![staged("STREET", "Contact", 3), staged("CITY", "Other", 4)];
        let mut idx = build_index(&fields).unwrap();
        let mut summary = RunSummary::default();
        let groups = vec![group("ADDR", &["STREET", "CITY"], None)];
        resolve_groups(&mut fields, &groups, &mut idx, "General", &mut summary).unwrap();
        let parent = &fields[2].field;
        assert_eq!(parent.key, "ADDR");
        assert_eq!(parent.label, "ADDR");
        assert_eq!(parent.section, "Contact");
        assert_eq!(parent.script_id.as_deref(), Some("GROUP:ADDR"));
        assert_eq!(idx.position("ADDR"), Some(2));
        assert_eq!(summary.synthesized_groups, vec!["ADDR"]);
    }
}
