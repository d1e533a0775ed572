use anyhow::Result;
use row_nest::core::grouping;
use row_nest::{ConvertOptions, GroupSpec, MappingDefinition, NestError, ResultConverter, Row};
use serde_json::{json, Value};

fn row(fields: &[(&str, &str)]) -> Row {
    fields.iter().copied().collect()
}

/// 飼主與寵物的測試資料
fn pet_rows() -> Vec<Row> {
    vec![
        row(&[("owner", "Al"), ("ownerAge", "40"), ("pet", "Rex"), ("petType", "dog")]),
        row(&[("owner", "Al"), ("ownerAge", "40"), ("pet", "Mia"), ("petType", "cat")]),
        row(&[("owner", "Bo"), ("ownerAge", "25"), ("pet", "Tom"), ("petType", "cat")]),
        row(&[("owner", "Al"), ("ownerAge", "40"), ("pet", "Bob"), ("petType", "dog")]),
    ]
}

fn owners(collect_age: bool, children: Vec<MappingDefinition>) -> Vec<MappingDefinition> {
    let mut spec = GroupSpec::new("owners", "owner", "ownerName");
    if collect_age {
        spec = spec.collect("ownerAge");
    }
    for child in children {
        spec = spec.child(child);
    }
    vec![spec.into()]
}

fn pet_types() -> MappingDefinition {
    GroupSpec::new("petTypes", "petType", "type")
        .child(MappingDefinition::pass_through("pets"))
        .into()
}

fn convert(rows: &[Row], mappings: Vec<MappingDefinition>) -> Result<Value> {
    let converter = ResultConverter::new(mappings)?;
    Ok(converter.convert(rows)?.into_json())
}

#[test]
fn test_owners_and_pets_example() -> Result<()> {
    let rows = vec![
        row(&[("owner", "Al"), ("pet", "Rex"), ("petType", "dog")]),
        row(&[("owner", "Al"), ("pet", "Mia"), ("petType", "cat")]),
        row(&[("owner", "Bo"), ("pet", "Tom"), ("petType", "cat")]),
    ];

    let output = convert(&rows, owners(false, vec![MappingDefinition::pass_through("pets")]))?;

    assert_eq!(
        output,
        json!({"owners": [
            {"ownerName": "Al", "pets": [
                {"pet": "Rex", "petType": "dog"},
                {"pet": "Mia", "petType": "cat"}
            ]},
            {"ownerName": "Bo", "pets": [{"pet": "Tom", "petType": "cat"}]}
        ]})
    );
    Ok(())
}

#[test]
fn test_one_layer_without_child_mappings() -> Result<()> {
    let output = convert(&pet_rows(), owners(false, vec![]))?;

    assert_eq!(
        output,
        json!({"owners": [
            {"ownerName": "Al", "children": [
                {"ownerAge": "40", "pet": "Rex", "petType": "dog"},
                {"ownerAge": "40", "pet": "Mia", "petType": "cat"},
                {"ownerAge": "40", "pet": "Bob", "petType": "dog"}
            ]},
            {"ownerName": "Bo", "children": [
                {"ownerAge": "25", "pet": "Tom", "petType": "cat"}
            ]}
        ]})
    );
    Ok(())
}

#[test]
fn test_one_layer_with_collected_property() -> Result<()> {
    let output = convert(
        &pet_rows(),
        owners(true, vec![MappingDefinition::pass_through("pets")]),
    )?;

    assert_eq!(
        output,
        json!({"owners": [
            {"ownerName": "Al", "ownerAge": "40", "pets": [
                {"pet": "Rex", "petType": "dog"},
                {"pet": "Mia", "petType": "cat"},
                {"pet": "Bob", "petType": "dog"}
            ]},
            {"ownerName": "Bo", "ownerAge": "25", "pets": [
                {"pet": "Tom", "petType": "cat"}
            ]}
        ]})
    );
    Ok(())
}

#[test]
fn test_two_layers() -> Result<()> {
    let output = convert(&pet_rows(), owners(false, vec![pet_types()]))?;

    assert_eq!(
        output,
        json!({"owners": [
            {"ownerName": "Al", "petTypes": [
                {"type": "dog", "pets": [
                    {"ownerAge": "40", "pet": "Rex"},
                    {"ownerAge": "40", "pet": "Bob"}
                ]},
                {"type": "cat", "pets": [{"ownerAge": "40", "pet": "Mia"}]}
            ]},
            {"ownerName": "Bo", "petTypes": [
                {"type": "cat", "pets": [{"ownerAge": "25", "pet": "Tom"}]}
            ]}
        ]})
    );
    Ok(())
}

#[test]
fn test_two_layers_with_collected_property() -> Result<()> {
    let output = convert(&pet_rows(), owners(true, vec![pet_types()]))?;

    assert_eq!(
        output,
        json!({"owners": [
            {"ownerName": "Al", "ownerAge": "40", "petTypes": [
                {"type": "dog", "pets": [{"pet": "Rex"}, {"pet": "Bob"}]},
                {"type": "cat", "pets": [{"pet": "Mia"}]}
            ]},
            {"ownerName": "Bo", "ownerAge": "25", "petTypes": [
                {"type": "cat", "pets": [{"pet": "Tom"}]}
            ]}
        ]})
    );
    Ok(())
}

#[test]
fn test_no_matching_group_property_passes_rows_through() -> Result<()> {
    let rows = pet_rows();
    let mappings = vec![
        GroupSpec::new("byColor", "color", "colorName").into(),
        MappingDefinition::pass_through("raw"),
    ];

    let output = convert(&rows, mappings)?;

    let expected: Vec<Value> = rows.iter().map(Row::to_json).collect();
    assert_eq!(output["byColor"], Value::Array(expected.clone()));
    assert_eq!(output["raw"], Value::Array(expected));
    Ok(())
}

#[test]
fn test_empty_input_produces_empty_output() -> Result<()> {
    let converter = ResultConverter::new(owners(true, vec![pet_types()]))?;

    let output = converter.convert(&[])?;

    assert!(output.is_empty());
    Ok(())
}

#[test]
fn test_all_empty_rows_are_omitted() -> Result<()> {
    let rows = vec![Row::new(), Row::new()];
    let mappings = vec![
        MappingDefinition::pass_through("raw"),
        GroupSpec::new("owners", "owner", "ownerName").into(),
    ];

    let output = ResultConverter::new(mappings)?.convert(&rows)?;

    assert!(!output.contains_key("raw"));
    assert!(!output.contains_key("owners"));
    Ok(())
}

#[test]
fn test_collect_field_missing_everywhere_is_a_no_op() -> Result<()> {
    let rows = pet_rows();
    let mappings = owners(false, vec![]);
    let mut with_collect = owners(false, vec![]);
    if let MappingDefinition::Grouped(spec) = &mut with_collect[0] {
        spec.to_collect.push("ownerEmail".to_string());
    }

    assert_eq!(convert(&rows, with_collect)?, convert(&rows, mappings)?);
    Ok(())
}

#[test]
fn test_rows_without_discriminant_are_dropped() -> Result<()> {
    let mut rows = pet_rows();
    rows.push(row(&[("pet", "Stray"), ("petType", "cat")]));

    let output = ResultConverter::new(owners(false, vec![MappingDefinition::pass_through("pets")]))?
        .convert(&rows)?;

    let pets: usize = output
        .get("owners")
        .unwrap_or_default()
        .iter()
        .map(|owner| owner["pets"].as_array().map(Vec::len).unwrap_or(0))
        .sum();
    assert_eq!(pets, 4);
    assert!(!serde_json::to_string(&output)?.contains("Stray"));
    Ok(())
}

#[test]
fn test_caller_rows_are_not_mutated() -> Result<()> {
    let rows = pet_rows();
    let before = rows.clone();

    convert(&rows, owners(true, vec![pet_types()]))?;

    assert_eq!(rows, before);
    Ok(())
}

#[test]
fn test_siblings_see_the_same_input() -> Result<()> {
    let rows = vec![
        row(&[("owner", "Al"), ("pet", "Rex")]),
        row(&[("owner", "Bo"), ("pet", "Tom")]),
    ];
    let mappings = vec![
        GroupSpec::new("owners", "owner", "ownerName")
            .child(MappingDefinition::pass_through("pets"))
            .into(),
        MappingDefinition::pass_through("raw"),
    ];

    let output = convert(&rows, mappings)?;

    assert_eq!(
        output["raw"],
        json!([{"owner": "Al", "pet": "Rex"}, {"owner": "Bo", "pet": "Tom"}])
    );
    Ok(())
}

fn contains_key_anywhere(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k == key || contains_key_anywhere(v, key)),
        Value::Array(items) => items.iter().any(|item| contains_key_anywhere(item, key)),
        _ => false,
    }
}

#[test]
fn test_consumed_fields_do_not_reappear_below() -> Result<()> {
    let output = convert(&pet_rows(), owners(true, vec![pet_types()]))?;

    for owner in output["owners"].as_array().into_iter().flatten() {
        for (key, nested) in owner.as_object().into_iter().flatten() {
            if key == "petTypes" {
                assert!(!contains_key_anywhere(nested, "owner"));
                assert!(!contains_key_anywhere(nested, "ownerAge"));
                assert!(!contains_key_anywhere(nested, "petType"));
            }
        }
    }
    Ok(())
}

#[test]
fn test_first_row_wins_unless_strict() -> Result<()> {
    let rows = vec![
        row(&[("owner", "Al"), ("ownerAge", "40"), ("pet", "Rex")]),
        row(&[("owner", "Al"), ("ownerAge", "41"), ("pet", "Mia")]),
    ];
    let mappings = owners(true, vec![MappingDefinition::pass_through("pets")]);

    let lenient = grouping::convert(&rows, &mappings)?.into_json();
    assert_eq!(lenient["owners"][0]["ownerAge"], "40");

    let strict = ResultConverter::with_options(
        mappings,
        ConvertOptions {
            strict_collection: true,
        },
    )?;
    assert!(matches!(
        strict.convert(&rows),
        Err(NestError::CollectionConflict { .. })
    ));
    Ok(())
}

#[test]
fn test_convert_to_definition_from_sparql_json() -> Result<()> {
    let raw = json!({
        "head": {"vars": ["owner", "ownerAge", "pet"]},
        "results": {"bindings": [
            {
                "owner": {"type": "uri", "value": "http://ex.org/Al"},
                "ownerAge": {"type": "typed-literal", "value": "40",
                             "datatype": "http://www.w3.org/2001/XMLSchema#integer"},
                "pet": {"type": "literal", "value": "Rex"}
            },
            {
                "owner": {"type": "uri", "value": "http://ex.org/Al"},
                "ownerAge": {"type": "typed-literal", "value": "40",
                             "datatype": "http://www.w3.org/2001/XMLSchema#integer"}
            }
        ]}
    });
    let converter = ResultConverter::new(owners(true, vec![MappingDefinition::pass_through("pets")]))?;

    let output = converter.convert_to_definition(&raw)?.into_json();

    // the second binding has nothing left besides the consumed fields
    assert_eq!(
        output,
        json!({"owners": [
            {"ownerName": "http://ex.org/Al", "ownerAge": "40", "pets": [{"pet": "Rex"}, {}]}
        ]})
    );
    Ok(())
}
