//! Task submission for a finished ingestion statement.
//!
//! Submission is split in three so the remote call never holds the wizard:
//! [`crate::wizard::Wizard::begin_submission`] captures the acting content,
//! [`PendingSubmission::run`] talks to the task service, and
//! [`crate::wizard::Wizard::complete_submission`] applies the result.

use tracing::{info, instrument, warn};

use crate::core::types::{LoaderContent, QueryContext};
use crate::io::services::TaskSubmitter;

/// A submission captured from the wizard, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    revision: u64,
    content: LoaderContent,
    query: String,
    context: QueryContext,
}

impl PendingSubmission {
    pub(crate) fn new(
        revision: u64,
        content: LoaderContent,
        query: String,
        context: QueryContext,
    ) -> Self {
        Self {
            revision,
            content,
            query,
            context,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Send the query to the task service.
    ///
    /// Never fails: service errors are carried in the outcome so the wizard
    /// can report them.
    #[instrument(skip_all, fields(revision = self.revision))]
    pub async fn run(self, submitter: &dyn TaskSubmitter) -> SubmissionOutcome {
        match submitter.submit_task_query(&self.query, &self.context).await {
            Ok(record) => {
                let task_id = record.task_id().to_string();
                info!(task_id = %task_id, "task service accepted query");
                SubmissionOutcome::succeeded(self, task_id)
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(error = %message, "task service rejected query");
                SubmissionOutcome::failed(self, message)
            }
        }
    }
}

/// Result of a submission, still tied to the content it was made for.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub(crate) revision: u64,
    pub(crate) content: LoaderContent,
    /// Task id, or the service's error message.
    pub result: Result<String, String>,
}

impl SubmissionOutcome {
    pub fn succeeded(pending: PendingSubmission, task_id: String) -> Self {
        Self {
            revision: pending.revision,
            content: pending.content,
            result: Ok(task_id),
        }
    }

    pub fn failed(pending: PendingSubmission, message: String) -> Self {
        Self {
            revision: pending.revision,
            content: pending.content,
            result: Err(message),
        }
    }
}

/// How a successful submission landed in the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionApplied {
    /// The task id was stored on the content.
    Recorded { task_id: String },
    /// The content changed meanwhile; the id was not stored.
    Stale { task_id: String },
}

impl SubmissionApplied {
    pub fn task_id(&self) -> &str {
        match self {
            SubmissionApplied::Recorded { task_id } | SubmissionApplied::Stale { task_id } => {
                task_id
            }
        }
    }
}
