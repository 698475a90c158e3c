//! Shared data model for the loader wizard.
//!
//! These types define the contracts between the wizard, its persisted
//! snapshot, and the collaborators it calls. Field names serialize in
//! camelCase so snapshots stay readable by other console tooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which wizard screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Ask whether to continue or discard an unsubmitted snapshot.
    Resume,
    /// Pick where the data comes from.
    SelectInputType,
    /// Configure how the sampled data is parsed.
    Parse,
    /// Review and edit the generated ingestion statement.
    Schema,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Resume => "resume",
            Step::SelectInputType => "select-input-type",
            Step::Parse => "parse",
            Step::Schema => "schema",
        }
    }
}

/// Execution parameters sent alongside a query.
///
/// Only `maxNumTasks` is interpreted by the loader; every other key is carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryContext(BTreeMap<String, Value>);

impl QueryContext {
    pub const MAX_NUM_TASKS: &'static str = "maxNumTasks";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// `maxNumTasks` when it is set to a non-negative integer.
    pub fn max_num_tasks(&self) -> Option<u32> {
        self.0
            .get(Self::MAX_NUM_TASKS)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    pub fn with_max_num_tasks(mut self, max_num_tasks: u32) -> Self {
        self.insert(Self::MAX_NUM_TASKS, max_num_tasks);
        self
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A typed JSON spec object such as `{"type": "http", "uris": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl SpecObject {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Where rows are read from (`http`, `s3`, `local`, `inline`, ...).
pub type InputSource = SpecObject;
/// How rows are decoded (`json`, `csv`, `parquet`, ...).
pub type InputFormat = SpecObject;

/// One column of the detected input signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
}

impl ColumnDeclaration {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }

    pub fn is_array(&self) -> bool {
        let ty = self.sql_type.trim().to_ascii_uppercase();
        ty.ends_with(" ARRAY") || ty.starts_with("ARRAY<")
    }
}

/// How array-typed input columns are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayMode {
    /// Keep arrays as `ARRAY` columns.
    #[default]
    Arrays,
    /// Store arrays as legacy multi-value strings.
    MultiValues,
}

/// Partially filled external source, accumulated by the first two steps.
///
/// Never persisted: it is discarded as soon as a query is generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_source: Option<InputSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<InputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<ColumnDeclaration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_mode: Option<ArrayMode>,
}

/// Payload emitted by the parse step (both the primary and the skip action).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub input_source: InputSource,
    pub input_format: InputFormat,
    pub signature: Vec<ColumnDeclaration>,
    /// SQL expression producing `__time`, if the data has a usable timestamp.
    pub time_expression: Option<String>,
    pub array_mode: ArrayMode,
}

/// The generated (and possibly hand-edited) ingestion statement.
///
/// This is the only durable wizard state. It is always replaced whole, never
/// patched in place, so a persisted snapshot is never half-updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderContent {
    pub query_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_context: Option<QueryContext>,
    /// Backing task id once submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl LoaderContent {
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            query_context: None,
            id: None,
        }
    }

    pub fn with_query_string(&self, query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            ..self.clone()
        }
    }

    pub fn with_query_context(&self, query_context: QueryContext) -> Self {
        Self {
            query_context: Some(query_context),
            ..self.clone()
        }
    }

    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self.clone()
        }
    }

    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.id.is_some()
    }

    pub fn to_query_with_context(&self) -> QueryWithContext {
        QueryWithContext {
            query_string: self.query_string.clone(),
            query_context: self.query_context.clone(),
        }
    }
}

/// A query handed to the free-form query view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryWithContext {
    pub query_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_context: Option<QueryContext>,
}

/// Point-in-time task slot availability. Never cached or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityInfo {
    pub available_task_slots: u32,
    #[serde(default)]
    pub used_task_slots: u32,
    #[serde(default)]
    pub total_task_slots: u32,
}

impl CapacityInfo {
    pub fn with_available(available_task_slots: u32) -> Self {
        Self {
            available_task_slots,
            used_task_slots: 0,
            total_task_slots: available_task_slots,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
}

/// A submitted query execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub status: ExecutionStatus,
}

/// What the task service hands back after a submission.
///
/// Depending on how far the service got, it returns either a full execution
/// or an intermediate state wrapping one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExecutionRecord {
    Execution(Execution),
    Intermediate { state: Execution },
}

impl ExecutionRecord {
    pub fn task_id(&self) -> &str {
        match self {
            ExecutionRecord::Execution(execution) => &execution.id,
            ExecutionRecord::Intermediate { state } => &state.id,
        }
    }
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Primary,
    Success,
    Warning,
    Danger,
}
