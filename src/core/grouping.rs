//! The recursive grouping engine.
//!
//! Every sibling definition works on the same input rows of its level.
//! Grouping builds fresh member rows with the consumed fields removed, so a
//! field that was grouped on or collected never shows up again further down
//! and the caller's rows are left untouched.

use crate::domain::mapping::{validate_mappings, GroupSpec, MappingDefinition, CHILDREN_KEY};
use crate::domain::model::{GroupEntry, Output, Row};
use crate::utils::error::{NestError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Fail when a collected field has different values inside one group
    /// instead of keeping the first row's value.
    #[serde(default)]
    pub strict_collection: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    options: ConvertOptions,
}

impl GroupingEngine {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    /// Validates the rule tree once, then converts.
    pub fn convert(&self, rows: &[Row], definitions: &[MappingDefinition]) -> Result<Output> {
        validate_mappings(definitions)?;
        self.convert_level(rows, definitions)
    }

    /// Trusts `definitions` to be validated already.
    pub(crate) fn convert_level(
        &self,
        rows: &[Row],
        definitions: &[MappingDefinition],
    ) -> Result<Output> {
        let mut output = Output::new();

        for definition in definitions {
            match definition {
                MappingDefinition::Grouped(spec)
                    if rows.iter().any(|row| row.has_value(&spec.property_to_group)) =>
                {
                    self.group_into(&mut output, rows, spec, definitions)?;
                }
                _ => pass_through(&mut output, rows, definition.root_name()),
            }
        }

        Ok(output)
    }

    fn group_into(
        &self,
        output: &mut Output,
        rows: &[Row],
        spec: &GroupSpec,
        siblings: &[MappingDefinition],
    ) -> Result<()> {
        let groups = partition(rows, &spec.property_to_group);
        tracing::debug!(
            "Grouping {} rows on '{}' into {} '{}' entries",
            rows.len(),
            spec.property_to_group,
            groups.len(),
            spec.root_name
        );

        for (discriminant, mut members) in groups {
            let collected = self.collect_fields(&mut members, spec, &discriminant)?;
            let entry = GroupEntry::new(&spec.root_name, &spec.name, discriminant).collected(collected)?;

            let entry = if spec.child_mappings.is_empty() {
                match leaf_children(members, siblings) {
                    Some(children) => entry.field(CHILDREN_KEY, Value::Array(children))?,
                    None => entry,
                }
            } else {
                entry.nested(self.convert_level(&members, &spec.child_mappings)?)?
            };

            output.push(&spec.root_name, entry.into_value());
        }

        Ok(())
    }

    /// Hoists every `toCollect` field that all members have a value for.
    /// The value of the first member wins unless strict collection is on.
    fn collect_fields(
        &self,
        members: &mut [Row],
        spec: &GroupSpec,
        discriminant: &str,
    ) -> Result<IndexMap<String, String>> {
        let mut collected = IndexMap::new();

        for field in &spec.to_collect {
            if !members.iter().all(|member| member.has_value(field)) {
                continue;
            }
            let Some(first) = members.first().and_then(|m| m.get(field)).map(str::to_string) else {
                continue;
            };

            if let Some(conflicting) = members
                .iter()
                .filter_map(|member| member.get(field))
                .find(|value| *value != first)
            {
                if self.options.strict_collection {
                    return Err(NestError::CollectionConflict {
                        field: field.clone(),
                        group: discriminant.to_string(),
                        first,
                        conflicting: conflicting.to_string(),
                    });
                }
                tracing::warn!(
                    "Collected field '{}' differs within group '{}' ('{}' vs '{}'), keeping the first value",
                    field,
                    discriminant,
                    first,
                    conflicting
                );
            }

            for member in members.iter_mut() {
                member.remove(field);
            }
            collected.insert(field.clone(), first);
        }

        Ok(collected)
    }
}

/// Convert with the default (lenient) options.
pub fn convert(rows: &[Row], definitions: &[MappingDefinition]) -> Result<Output> {
    GroupingEngine::default().convert(rows, definitions)
}

/// Splits rows by the value of `property`, in first-occurrence order.
///
/// Rows without the field belong to no group. Members come back as copies
/// with `property` removed.
pub fn partition(rows: &[Row], property: &str) -> IndexMap<String, Vec<Row>> {
    let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();

    for row in rows {
        let Some(discriminant) = row.get(property) else {
            continue;
        };
        let mut member = row.clone();
        member.remove(property);
        groups.entry(discriminant.to_string()).or_default().push(member);
    }

    groups
}

fn pass_through(output: &mut Output, rows: &[Row], root_name: &str) {
    if rows.iter().all(Row::is_empty) {
        tracing::debug!("Nothing left for '{}', omitting it", root_name);
        return;
    }
    output.insert(root_name, rows.iter().map(Row::to_json).collect());
}

/// Leftover rows of a grouping node without child mappings. Fields some
/// sibling groups on are dropped; all-empty leftovers yield `None`.
fn leaf_children(members: Vec<Row>, siblings: &[MappingDefinition]) -> Option<Vec<Value>> {
    let pruned: Vec<Row> = members
        .into_iter()
        .map(|mut row| {
            for property in siblings.iter().filter_map(MappingDefinition::property_to_group) {
                row.remove(property);
            }
            row
        })
        .collect();

    if pruned.iter().all(Row::is_empty) {
        return None;
    }
    Some(pruned.iter().map(Row::to_json).collect())
}
