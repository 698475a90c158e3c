//! Collaborators the wizard talks to but does not own.
//!
//! The remote services (capacity probe, task submission) are async and
//! fallible; everything else is synchronous. Tests substitute scripted
//! implementations from `test_support`.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::core::types::{CapacityInfo, ExecutionRecord, Intent, QueryContext, QueryWithContext};
use crate::io::config::LoaderConfig;

/// Synchronous cluster capability hints.
pub trait Capabilities {
    /// Total task slots the cluster can offer, if known.
    fn max_task_slots(&self) -> Option<u32>;
}

/// Capabilities fixed at startup (e.g. from config).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticCapabilities {
    pub max_task_slots: Option<u32>,
}

impl From<&LoaderConfig> for StaticCapabilities {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            max_task_slots: config.max_task_slots,
        }
    }
}

impl Capabilities for StaticCapabilities {
    fn max_task_slots(&self) -> Option<u32> {
        self.max_task_slots
    }
}

/// Live capacity lookup. `Ok(None)` means the cluster could not say.
#[async_trait]
pub trait CapacityProbe: Send + Sync {
    async fn cluster_capacity(&self) -> Result<Option<CapacityInfo>>;
}

/// Submits an ingestion query as a task.
#[async_trait]
pub trait TaskSubmitter: Send + Sync {
    async fn submit_task_query(
        &self,
        query: &str,
        context: &QueryContext,
    ) -> Result<ExecutionRecord>;
}

/// Fire-and-forget, user-visible notification sink.
pub trait Notifier {
    fn show(&self, message: &str, intent: Intent);
}

/// Notifier that forwards messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, message: &str, intent: Intent) {
        match intent {
            Intent::Danger => error!(target: "sql_loader::notify", "{message}"),
            Intent::Warning => warn!(target: "sql_loader::notify", "{message}"),
            Intent::Primary | Intent::Success => info!(target: "sql_loader::notify", "{message}"),
        }
    }
}

/// Navigation out of the wizard.
pub trait Navigator {
    /// Open a query in the free-form query view.
    fn go_to_query(&self, query: QueryWithContext);
    /// Open the task view for a submitted task.
    fn go_to_task(&self, task_id: &str);
    fn go_to_task_group(&self, task_group_id: &str);
}
