//! Test-only fakes and fixtures for driving the wizard without a cluster.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tempfile::TempDir;

use crate::core::types::{
    ArrayMode, CapacityInfo, ColumnDeclaration, Execution, ExecutionRecord, ExecutionStatus,
    InputFormat, InputSource, Intent, ParsedInput, QueryContext, QueryWithContext, SpecObject,
};
use crate::io::config::LoaderPaths;
use crate::io::services::{
    CapacityProbe, Navigator, Notifier, StaticCapabilities, TaskSubmitter,
};
use crate::io::snapshot::SnapshotStore;
use crate::io::store::FileStore;
use crate::session::LoaderServices;

pub fn wiki_source() -> InputSource {
    SpecObject::new("http").with(
        "uris",
        vec!["https://druid.apache.org/data/wikipedia.json.gz"],
    )
}

pub fn wiki_format() -> InputFormat {
    SpecObject::new("json")
}

/// Parse-step payload for the wikipedia sample.
pub fn parsed_wiki_input() -> ParsedInput {
    ParsedInput {
        input_source: wiki_source(),
        input_format: wiki_format(),
        signature: vec![
            ColumnDeclaration::new("timestamp", "VARCHAR"),
            ColumnDeclaration::new("page", "VARCHAR"),
            ColumnDeclaration::new("added", "BIGINT"),
        ],
        time_expression: Some("TIME_PARSE(\"timestamp\")".to_string()),
        array_mode: ArrayMode::Arrays,
    }
}

pub fn execution_record(id: &str) -> ExecutionRecord {
    ExecutionRecord::Execution(Execution {
        id: id.to_string(),
        status: ExecutionStatus::Running,
    })
}

/// Probe returning the same answer every time.
#[derive(Debug, Clone)]
pub struct FixedCapacityProbe {
    capacity: Option<CapacityInfo>,
    calls: Arc<AtomicUsize>,
}

impl FixedCapacityProbe {
    pub fn new(capacity: Option<CapacityInfo>) -> Self {
        Self {
            capacity,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapacityProbe for FixedCapacityProbe {
    async fn cluster_capacity(&self) -> Result<Option<CapacityInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.capacity)
    }
}

/// Probe that always errors.
#[derive(Debug, Clone, Copy)]
pub struct FailingCapacityProbe;

#[async_trait]
impl CapacityProbe for FailingCapacityProbe {
    async fn cluster_capacity(&self) -> Result<Option<CapacityInfo>> {
        Err(anyhow!("capacity endpoint unreachable"))
    }
}

/// Task service that replays queued responses and records each call.
///
/// Clones share the queue and the call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSubmitter {
    responses: Arc<Mutex<VecDeque<Result<ExecutionRecord, String>>>>,
    calls: Arc<Mutex<Vec<(String, QueryContext)>>>,
}

impl ScriptedSubmitter {
    pub fn new(responses: Vec<Result<ExecutionRecord, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(query, context)` pairs in submission order.
    pub fn calls(&self) -> Vec<(String, QueryContext)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl TaskSubmitter for ScriptedSubmitter {
    async fn submit_task_query(
        &self,
        query: &str,
        context: &QueryContext,
    ) -> Result<ExecutionRecord> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((query.to_string(), context.clone()));
        let next = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response left"))?;
        next.map_err(|message| anyhow!(message))
    }
}

/// Notifier that keeps every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(String, Intent)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Intent)> {
        self.messages.lock().expect("messages lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: &str, intent: Intent) {
        self.messages
            .lock()
            .expect("messages lock")
            .push((message.to_string(), intent));
    }
}

/// Navigator that records where the wizard tried to go.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    queries: Arc<Mutex<Vec<QueryWithContext>>>,
    tasks: Arc<Mutex<Vec<String>>>,
    task_groups: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn queries(&self) -> Vec<QueryWithContext> {
        self.queries.lock().expect("queries lock").clone()
    }

    pub fn tasks(&self) -> Vec<String> {
        self.tasks.lock().expect("tasks lock").clone()
    }

    pub fn task_groups(&self) -> Vec<String> {
        self.task_groups.lock().expect("task groups lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to_query(&self, query: QueryWithContext) {
        self.queries.lock().expect("queries lock").push(query);
    }

    fn go_to_task(&self, task_id: &str) {
        self.tasks
            .lock()
            .expect("tasks lock")
            .push(task_id.to_string());
    }

    fn go_to_task_group(&self, task_group_id: &str) {
        self.task_groups
            .lock()
            .expect("task groups lock")
            .push(task_group_id.to_string());
    }
}

/// Assemble services from fakes, with a recording navigator.
pub fn services(
    max_task_slots: Option<u32>,
    probe: Option<FixedCapacityProbe>,
    submitter: ScriptedSubmitter,
    notifier: RecordingNotifier,
) -> LoaderServices {
    LoaderServices {
        capabilities: Box::new(StaticCapabilities { max_task_slots }),
        capacity_probe: probe.map(|p| Box::new(p) as Box<dyn CapacityProbe>),
        submitter: Box::new(submitter),
        notifier: Box::new(notifier),
        navigator: Box::new(RecordingNavigator::default()),
    }
}

/// Temporary project root with a `.sql-loader/` layout.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn paths(&self) -> LoaderPaths {
        LoaderPaths::new(self.path())
    }

    /// A fresh bridge over the project's state directory.
    ///
    /// Each call reads the same files, which is how a restart looks.
    pub fn snapshots(&self) -> SnapshotStore {
        SnapshotStore::new(FileStore::new(self.paths().state_dir))
    }
}
