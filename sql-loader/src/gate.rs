//! Capacity check run right before submitting an ingestion task.

use tracing::{debug, instrument, warn};

use crate::core::capacity::{DEFAULT_MAX_NUM_TASKS, GateDecision, decide, effective_context};
use crate::core::types::QueryContext;
use crate::io::config::LoaderConfig;
use crate::io::services::CapacityProbe;

/// Decides whether the cluster likely has room for a task before submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityGate {
    default_max_num_tasks: u32,
}

impl Default for CapacityGate {
    fn default() -> Self {
        Self {
            default_max_num_tasks: DEFAULT_MAX_NUM_TASKS,
        }
    }
}

impl From<&LoaderConfig> for CapacityGate {
    fn from(config: &LoaderConfig) -> Self {
        Self::new(config.default_max_num_tasks())
    }
}

impl CapacityGate {
    pub fn new(default_max_num_tasks: u32) -> Self {
        Self {
            default_max_num_tasks,
        }
    }

    pub fn default_max_num_tasks(&self) -> u32 {
        self.default_max_num_tasks
    }

    /// Merge the slot hint into the context, probe capacity, and decide.
    ///
    /// Without a probe, or when the probe fails or has no answer, capacity is
    /// treated as unknown and the gate proceeds.
    #[instrument(skip_all, fields(max_slots_hint = ?max_slots_hint, has_probe = probe.is_some()))]
    pub async fn evaluate(
        &self,
        query_context: Option<&QueryContext>,
        max_slots_hint: Option<u32>,
        probe: Option<&dyn CapacityProbe>,
    ) -> GateDecision {
        let effective = effective_context(query_context, max_slots_hint);
        let capacity = match probe {
            Some(probe) => match probe.cluster_capacity().await {
                Ok(capacity) => capacity,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "capacity probe failed; assuming capacity is available");
                    None
                }
            },
            None => None,
        };
        let decision = decide(effective, capacity, self.default_max_num_tasks);
        debug!(
            available = capacity.map(|c| c.available_task_slots),
            confirm = matches!(decision, GateDecision::Confirm(_)),
            "capacity gate decided"
        );
        decision
    }
}
