//! Mapping definitions: the declarative rule tree that drives a conversion.
//!
//! Definitions are written as plain JSON/TOML objects (`rootName`,
//! `propertyToGroup`, `name`, `toCollect`, `childMappings`) and resolved once
//! into [`MappingDefinition`], which is either a pass-through node or a
//! grouping node.

use crate::utils::error::{NestError, Result};
use crate::utils::validation::find_duplicate;
use serde::{Deserialize, Serialize};

/// Key used for leftover rows of a grouping node without child mappings.
pub const CHILDREN_KEY: &str = "children";

/// The on-the-wire shape of a mapping definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMappingDefinition {
    #[serde(alias = "root_name")]
    pub root_name: String,
    #[serde(default, alias = "property_to_group", skip_serializing_if = "Option::is_none")]
    pub property_to_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "to_collect", skip_serializing_if = "Vec::is_empty")]
    pub to_collect: Vec<String>,
    #[serde(default, alias = "child_mappings", skip_serializing_if = "Vec::is_empty")]
    pub child_mappings: Vec<MappingDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMappingDefinition", into = "RawMappingDefinition")]
pub enum MappingDefinition {
    /// Forwards the input rows unchanged under `root_name`.
    PassThrough { root_name: String },
    Grouped(GroupSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub root_name: String,
    pub property_to_group: String,
    /// Output field that receives the discriminant.
    pub name: String,
    pub to_collect: Vec<String>,
    pub child_mappings: Vec<MappingDefinition>,
}

impl GroupSpec {
    pub fn new(
        root_name: impl Into<String>,
        property_to_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            root_name: root_name.into(),
            property_to_group: property_to_group.into(),
            name: name.into(),
            to_collect: Vec::new(),
            child_mappings: Vec::new(),
        }
    }

    pub fn collect(mut self, field: impl Into<String>) -> Self {
        self.to_collect.push(field.into());
        self
    }

    pub fn child(mut self, mapping: impl Into<MappingDefinition>) -> Self {
        self.child_mappings.push(mapping.into());
        self
    }

    /// Keys a single group entry will carry besides the discriminant.
    fn entry_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.name.as_str()];
        keys.extend(self.to_collect.iter().map(String::as_str));
        if self.child_mappings.is_empty() {
            keys.push(CHILDREN_KEY);
        } else {
            keys.extend(self.child_mappings.iter().map(MappingDefinition::root_name));
        }
        keys
    }
}

impl From<GroupSpec> for MappingDefinition {
    fn from(spec: GroupSpec) -> Self {
        MappingDefinition::Grouped(spec)
    }
}

impl MappingDefinition {
    pub fn pass_through(root_name: impl Into<String>) -> Self {
        MappingDefinition::PassThrough {
            root_name: root_name.into(),
        }
    }

    pub fn root_name(&self) -> &str {
        match self {
            MappingDefinition::PassThrough { root_name } => root_name,
            MappingDefinition::Grouped(spec) => &spec.root_name,
        }
    }

    pub fn property_to_group(&self) -> Option<&str> {
        match self {
            MappingDefinition::PassThrough { .. } => None,
            MappingDefinition::Grouped(spec) => Some(&spec.property_to_group),
        }
    }

    /// Depth of the rule tree rooted at this node.
    pub fn depth(&self) -> usize {
        match self {
            MappingDefinition::PassThrough { .. } => 1,
            MappingDefinition::Grouped(spec) => {
                1 + spec
                    .child_mappings
                    .iter()
                    .map(MappingDefinition::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    fn check_node(&self) -> Result<()> {
        let invalid = |reason: &str| NestError::InvalidMapping {
            root_name: self.root_name().to_string(),
            reason: reason.to_string(),
        };

        if self.root_name().trim().is_empty() {
            return Err(invalid("rootName cannot be empty"));
        }
        if let MappingDefinition::Grouped(spec) = self {
            if spec.property_to_group.is_empty() {
                return Err(invalid("propertyToGroup cannot be empty"));
            }
            if spec.name.is_empty() {
                return Err(invalid("a grouping mapping needs a name"));
            }
        }
        Ok(())
    }
}

impl TryFrom<RawMappingDefinition> for MappingDefinition {
    type Error = NestError;

    fn try_from(raw: RawMappingDefinition) -> Result<Self> {
        let mapping = match raw.property_to_group {
            Some(property_to_group) => {
                let name = raw.name.ok_or_else(|| NestError::InvalidMapping {
                    root_name: raw.root_name.clone(),
                    reason: format!("propertyToGroup '{}' is set but name is missing", property_to_group),
                })?;
                MappingDefinition::Grouped(GroupSpec {
                    root_name: raw.root_name,
                    property_to_group,
                    name,
                    to_collect: raw.to_collect,
                    child_mappings: raw.child_mappings,
                })
            }
            None => {
                if raw.name.is_some() || !raw.to_collect.is_empty() || !raw.child_mappings.is_empty() {
                    tracing::warn!(
                        "Mapping '{}' has no propertyToGroup; name, toCollect and childMappings are ignored",
                        raw.root_name
                    );
                }
                MappingDefinition::PassThrough {
                    root_name: raw.root_name,
                }
            }
        };
        mapping.check_node()?;
        Ok(mapping)
    }
}

impl From<MappingDefinition> for RawMappingDefinition {
    fn from(mapping: MappingDefinition) -> Self {
        match mapping {
            MappingDefinition::PassThrough { root_name } => RawMappingDefinition {
                root_name,
                ..Default::default()
            },
            MappingDefinition::Grouped(spec) => RawMappingDefinition {
                root_name: spec.root_name,
                property_to_group: Some(spec.property_to_group),
                name: Some(spec.name),
                to_collect: spec.to_collect,
                child_mappings: spec.child_mappings,
            },
        }
    }
}

/// Checks a sibling list and everything below it.
///
/// Sibling `rootName`s must be unique, and the keys of a group entry
/// (name, collected fields, child `rootName`s or `children`) must not overlap.
pub fn validate_mappings(mappings: &[MappingDefinition]) -> Result<()> {
    if let Some(root_name) = find_duplicate(mappings.iter().map(MappingDefinition::root_name)) {
        return Err(NestError::DuplicateRootName {
            root_name: root_name.to_string(),
        });
    }

    for mapping in mappings {
        mapping.check_node()?;
        if let MappingDefinition::Grouped(spec) = mapping {
            if let Some(key) = find_duplicate(spec.entry_keys()) {
                return Err(NestError::KeyCollision {
                    key: key.to_string(),
                    group: spec.root_name.clone(),
                });
            }
            validate_mappings(&spec.child_mappings)?;
        }
    }
    Ok(())
}

pub fn mappings_from_json(content: &str) -> Result<Vec<MappingDefinition>> {
    let mappings: Vec<MappingDefinition> = serde_json::from_str(content)?;
    validate_mappings(&mappings)?;
    Ok(mappings)
}
