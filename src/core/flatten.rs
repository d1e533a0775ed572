//! Flattening of SPARQL SELECT results into [`Row`]s.
//!
//! JSON results (`application/sparql-results+json`) keep only the `value` of
//! every bound term. CSV results use the header as variable names and treat
//! an empty cell as an unbound variable.

use crate::domain::model::Row;
use crate::utils::error::{NestError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Json,
    Csv,
}

impl InputFormat {
    pub const ALL: [&'static str; 2] = ["json", "csv"];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Json => "json",
            InputFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = NestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "csv" => Ok(InputFormat::Csv),
            other => Err(NestError::InvalidConfigValueError {
                field: "input.format".to_string(),
                value: other.to_string(),
                reason: format!("Supported formats: {}", InputFormat::ALL.join(", ")),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub head: ResultHead,
    pub results: ResultSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultHead {
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub bindings: Vec<Binding>,
}

/// One result line: variable name to its bound term. Unbound variables are absent.
pub type Binding = IndexMap<String, BoundTerm>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundTerm {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    TypedLiteral,
    Bnode,
}

pub fn extract_values(bindings: &[Binding]) -> Vec<Row> {
    bindings
        .iter()
        .map(|binding| {
            binding
                .iter()
                .map(|(var, term)| (var.as_str(), term.value.as_str()))
                .collect::<Row>()
        })
        .collect()
}

/// Accepts a full results document or a bare `bindings` array.
pub fn rows_from_json(raw: &Value) -> Result<Vec<Row>> {
    match raw {
        Value::Array(_) => {
            let bindings = Vec::<Binding>::deserialize(raw)?;
            Ok(extract_values(&bindings))
        }
        Value::Object(obj) if obj.contains_key("boolean") => Err(NestError::MalformedResult {
            message: "ASK results carry no bindings".to_string(),
        }),
        Value::Object(obj) if obj.contains_key("results") => {
            let results = SparqlResults::deserialize(raw)?;
            tracing::debug!(
                "Flattening {} bindings over vars {:?}",
                results.results.bindings.len(),
                results.head.vars
            );
            Ok(extract_values(&results.results.bindings))
        }
        _ => Err(NestError::MalformedResult {
            message: "expected a SPARQL results document or a bindings array".to_string(),
        }),
    }
}

pub fn rows_from_csv<R: std::io::Read>(input: R) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

pub fn rows_from_bytes(data: &[u8], format: InputFormat) -> Result<Vec<Row>> {
    match format {
        InputFormat::Json => {
            let raw: Value = serde_json::from_slice(data)?;
            rows_from_json(&raw)
        }
        InputFormat::Csv => rows_from_csv(data),
    }
}
