use crate::core::flatten;
use crate::core::grouping::{ConvertOptions, GroupingEngine};
use crate::domain::mapping::{validate_mappings, MappingDefinition};
use crate::domain::model::{Output, Row};
use crate::utils::error::Result;
use serde_json::Value;

/// Turns flat query results into nested documents following a validated
/// list of mapping definitions.
#[derive(Debug, Clone)]
pub struct ResultConverter {
    definitions: Vec<MappingDefinition>,
    engine: GroupingEngine,
}

impl ResultConverter {
    pub fn new(definitions: Vec<MappingDefinition>) -> Result<Self> {
        Self::with_options(definitions, ConvertOptions::default())
    }

    pub fn with_options(definitions: Vec<MappingDefinition>, options: ConvertOptions) -> Result<Self> {
        validate_mappings(&definitions)?;
        Ok(Self {
            definitions,
            engine: GroupingEngine::new(options),
        })
    }

    pub fn definitions(&self) -> &[MappingDefinition] {
        &self.definitions
    }

    pub fn options(&self) -> ConvertOptions {
        self.engine.options()
    }

    /// Flattens a raw SPARQL JSON result (document or bindings array) and converts it.
    pub fn convert_to_definition(&self, raw: &Value) -> Result<Output> {
        let rows = flatten::rows_from_json(raw)?;
        self.convert(&rows)
    }

    pub fn convert(&self, rows: &[Row]) -> Result<Output> {
        tracing::debug!(
            "Converting {} rows with {} top-level mappings",
            rows.len(),
            self.definitions.len()
        );
        self.engine.convert_level(rows, &self.definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::GroupSpec;
    use crate::utils::error::NestError;
    use serde_json::json;

    #[test]
    fn test_new_validates_definitions() {
        let result = ResultConverter::new(vec![
            MappingDefinition::pass_through("rows"),
            MappingDefinition::pass_through("rows"),
        ]);
        assert!(matches!(result, Err(NestError::DuplicateRootName { .. })));
    }

    #[test]
    fn test_convert_to_definition_from_raw_bindings() {
        let converter = ResultConverter::new(vec![GroupSpec::new("owners", "owner", "ownerName")
            .child(MappingDefinition::pass_through("pets"))
            .into()])
        .unwrap();

        let raw = json!({
            "head": {"vars": ["owner", "pet"]},
            "results": {"bindings": [
                {"owner": {"type": "literal", "value": "Al"}, "pet": {"type": "literal", "value": "Rex"}},
                {"owner": {"type": "literal", "value": "Al"}, "pet": {"type": "literal", "value": "Mia"}}
            ]}
        });

        let output = converter.convert_to_definition(&raw).unwrap();

        assert_eq!(
            output.into_json(),
            json!({"owners": [{"ownerName": "Al", "pets": [{"pet": "Rex"}, {"pet": "Mia"}]}]})
        );
    }
}
