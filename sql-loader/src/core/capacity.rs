//! Pure capacity decisions made right before task submission.

use crate::core::types::{CapacityInfo, QueryContext};

/// Concurrency assumed when neither the query nor the cluster says otherwise.
pub const DEFAULT_MAX_NUM_TASKS: u32 = 2;

/// Outcome of the capacity check.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Capacity is sufficient (or unknown); submit with this context.
    Proceed { effective_context: QueryContext },
    /// The cluster looks too busy; ask before submitting.
    Confirm(CapacityShortfall),
}

/// Details shown to the user when asking for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityShortfall {
    pub max_num_tasks: u32,
    pub capacity: CapacityInfo,
    /// Context to submit with if the user runs anyway.
    pub effective_context: QueryContext,
}

/// Fill in `maxNumTasks` from the cluster hint unless the query already sets it.
///
/// A present key is never replaced, even when its value is not a number.
pub fn effective_context(
    query_context: Option<&QueryContext>,
    max_slots_hint: Option<u32>,
) -> QueryContext {
    let mut context = query_context.cloned().unwrap_or_default();
    if let Some(hint) = max_slots_hint {
        if !context.contains_key(QueryContext::MAX_NUM_TASKS) {
            context.insert(QueryContext::MAX_NUM_TASKS, hint);
        }
    }
    context
}

pub fn effective_max_num_tasks(context: &QueryContext, fallback: u32) -> u32 {
    context.max_num_tasks().unwrap_or(fallback)
}

/// Decide whether to proceed or ask, given an optional capacity snapshot.
///
/// An unknown capacity never blocks submission.
pub fn decide(
    effective_context: QueryContext,
    capacity: Option<CapacityInfo>,
    fallback_max_num_tasks: u32,
) -> GateDecision {
    let max_num_tasks = effective_max_num_tasks(&effective_context, fallback_max_num_tasks);
    match capacity {
        Some(capacity) if capacity.available_task_slots < max_num_tasks => {
            GateDecision::Confirm(CapacityShortfall {
                max_num_tasks,
                capacity,
                effective_context,
            })
        }
        _ => GateDecision::Proceed { effective_context },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hint_fills_missing_max_num_tasks() {
        let ctx = effective_context(None, Some(8));
        assert_eq!(ctx.max_num_tasks(), Some(8));
    }

    #[test]
    fn explicit_max_num_tasks_is_never_overwritten() {
        let explicit = QueryContext::new().with_max_num_tasks(2);
        let ctx = effective_context(Some(&explicit), Some(8));
        assert_eq!(ctx.max_num_tasks(), Some(2));

        let odd: QueryContext = [("maxNumTasks", json!(null))].into_iter().collect();
        let ctx = effective_context(Some(&odd), Some(8));
        assert_eq!(ctx.get("maxNumTasks"), Some(&json!(null)));
        assert_eq!(effective_max_num_tasks(&ctx, DEFAULT_MAX_NUM_TASKS), 2);
    }

    #[test]
    fn other_context_keys_are_preserved() {
        let base: QueryContext = [("finalizeAggregations", json!(false))]
            .into_iter()
            .collect();
        let ctx = effective_context(Some(&base), Some(4));
        assert_eq!(ctx.get("finalizeAggregations"), Some(&json!(false)));
        assert_eq!(ctx.max_num_tasks(), Some(4));
    }

    #[test]
    fn shortfall_requires_confirmation() {
        let decision = decide(
            effective_context(None, Some(8)),
            Some(CapacityInfo::with_available(3)),
            DEFAULT_MAX_NUM_TASKS,
        );
        match decision {
            GateDecision::Confirm(shortfall) => {
                assert_eq!(shortfall.max_num_tasks, 8);
                assert_eq!(shortfall.capacity.available_task_slots, 3);
            }
            other => panic!("expected confirm, got {other:?}"),
        }
    }

    #[test]
    fn exact_capacity_proceeds() {
        let decision = decide(
            QueryContext::new().with_max_num_tasks(5),
            Some(CapacityInfo::with_available(5)),
            DEFAULT_MAX_NUM_TASKS,
        );
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn unknown_capacity_proceeds() {
        let decision = decide(
            QueryContext::new().with_max_num_tasks(100),
            None,
            DEFAULT_MAX_NUM_TASKS,
        );
        assert_eq!(
            decision,
            GateDecision::Proceed {
                effective_context: QueryContext::new().with_max_num_tasks(100)
            }
        );
    }

    #[test]
    fn fallback_applies_without_hint() {
        let decision = decide(
            effective_context(None, None),
            Some(CapacityInfo::with_available(1)),
            DEFAULT_MAX_NUM_TASKS,
        );
        match decision {
            GateDecision::Confirm(shortfall) => assert_eq!(shortfall.max_num_tasks, 2),
            other => panic!("expected confirm, got {other:?}"),
        }
    }
}
