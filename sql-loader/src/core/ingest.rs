//! Translation from a chosen external source to an ingestion statement.
//!
//! The wizard never builds SQL by hand: the parse step's choices become an
//! [`IngestQueryPattern`], which renders to a `REPLACE INTO ... OVERWRITE ALL`
//! statement the user can then edit freely.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde_json::Value;

use crate::core::sql::{quote_identifier, quote_literal};
use crate::core::types::{ArrayMode, ColumnDeclaration, InputFormat, InputSource, ParsedInput};

const INGEST_QUERY_TEMPLATE: &str = include_str!("templates/ingest_query.sql");
const FALLBACK_DATASOURCE: &str = "data";

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template("ingest_query", INGEST_QUERY_TEMPLATE)
        .expect("ingest query template should be valid");
    env
});

/// The external table the statement reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalSource {
    pub input_source: InputSource,
    pub input_format: InputFormat,
    pub signature: Vec<ColumnDeclaration>,
}

impl From<&ParsedInput> for ExternalSource {
    fn from(input: &ParsedInput) -> Self {
        Self {
            input_source: input.input_source.clone(),
            input_format: input.input_format.clone(),
            signature: input.signature.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    Insert,
    Replace,
}

/// Structured form of a generated ingestion statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestQueryPattern {
    pub destination_table_name: String,
    pub mode: IngestMode,
    pub source: ExternalSource,
    pub time_expression: Option<String>,
    /// Time granularity (`DAY`, `HOUR`, `ALL`, ...).
    pub partitioned_by: String,
    pub array_mode: ArrayMode,
}

/// Build an ingest pattern for a freshly chosen source.
///
/// Without a `partitioned_by` hint, data with a time expression is
/// partitioned by `DAY` and data without one by `ALL`.
pub fn external_config_to_ingest_pattern(
    source: ExternalSource,
    time_expression: Option<&str>,
    partitioned_by: Option<&str>,
    array_mode: ArrayMode,
) -> IngestQueryPattern {
    let time_expression = time_expression
        .map(str::trim)
        .filter(|expr| !expr.is_empty())
        .map(str::to_string);
    let partitioned_by = match (partitioned_by, &time_expression) {
        (Some(hint), _) => hint.trim().to_ascii_uppercase(),
        (None, Some(_)) => "DAY".to_string(),
        (None, None) => "ALL".to_string(),
    };
    IngestQueryPattern {
        destination_table_name: guess_datasource_name(&source.input_source),
        mode: IngestMode::Replace,
        source,
        time_expression,
        partitioned_by,
        array_mode,
    }
}

impl IngestQueryPattern {
    /// Render the pattern as SQL text.
    pub fn to_query_string(&self) -> Result<String> {
        let input_source =
            serde_json::to_string(&self.source.input_source).context("serialize input source")?;
        let input_format =
            serde_json::to_string(&self.source.input_format).context("serialize input format")?;
        let extend = (!self.source.signature.is_empty()).then(|| {
            self.source
                .signature
                .iter()
                .map(|column| format!("{} {}", quote_identifier(&column.name), column.sql_type))
                .collect::<Vec<_>>()
                .join(", ")
        });

        let template = TEMPLATES.get_template("ingest_query")?;
        let rendered = template
            .render(context! {
                verb => match self.mode {
                    IngestMode::Insert => "INSERT",
                    IngestMode::Replace => "REPLACE",
                },
                overwrite => self.mode == IngestMode::Replace,
                destination => quote_identifier(&self.destination_table_name),
                input_source => quote_literal(&input_source),
                input_format => quote_literal(&input_format),
                extend => extend,
                columns => self.select_columns(),
                partitioned_by => &self.partitioned_by,
            })
            .context("render ingest query")?;
        Ok(rendered)
    }

    fn select_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.source.signature.len() + 1);
        if let Some(expr) = &self.time_expression {
            columns.push(format!("{expr} AS \"__time\""));
        }
        for column in &self.source.signature {
            if self.time_expression.is_some() && column.name == "__time" {
                continue;
            }
            let name = quote_identifier(&column.name);
            if self.array_mode == ArrayMode::MultiValues && column.is_array() {
                columns.push(format!("ARRAY_TO_MV({name}) AS {name}"));
            } else {
                columns.push(name);
            }
        }
        if columns.is_empty() {
            columns.push("*".to_string());
        }
        columns
    }
}

/// Guess a datasource name from the first path the input source points at.
///
/// `https://example.com/wikiticker-2015-09-12.json.gz` becomes
/// `wikiticker-2015-09-12`.
pub fn guess_datasource_name(input_source: &InputSource) -> String {
    if input_source.kind == "inline" {
        return "inline_data".to_string();
    }
    let path = ["uris", "prefixes", "files"]
        .iter()
        .find_map(|key| first_string(input_source.property(key)))
        .or_else(|| {
            input_source
                .property("objects")
                .and_then(|objects| objects.get(0))
                .and_then(|object| object.get("path").or_else(|| object.get("name")))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| {
            input_source
                .property("baseDir")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    path.map(|p| datasource_from_path(&p))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_DATASOURCE.to_string())
}

fn first_string(value: Option<&Value>) -> Option<String> {
    value?.get(0)?.as_str().map(str::to_string)
}

fn datasource_from_path(path: &str) -> String {
    let without_query = path.split(['?', '#']).next().unwrap_or_default();
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let stem = segment.split('.').next().unwrap_or_default();
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
