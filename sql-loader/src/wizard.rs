//! Wizard state and its transitions.
//!
//! [`Wizard`] owns the ephemeral external config, the persisted loader
//! content, and the resume flag. The visible step is never stored: it is
//! re-derived from that data by [`derive_step`] after every transition.
//!
//! Content changes go through one choke point that saves the new value before
//! updating memory and bumps a revision counter. Submissions capture that
//! revision so a result arriving after the user moved on is dropped instead of
//! clobbering newer state.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::capacity::CapacityShortfall;
use crate::core::ingest::{ExternalSource, external_config_to_ingest_pattern};
use crate::core::sql::ingest_table;
use crate::core::step::{derive_step, needs_verify};
use crate::core::types::{
    ExternalConfig, InputFormat, InputSource, LoaderContent, ParsedInput, QueryContext,
    QueryWithContext, Step,
};
use crate::io::snapshot::SnapshotStore;
use crate::submit::{PendingSubmission, SubmissionApplied, SubmissionOutcome};

/// Failures that abort a transition and leave the wizard where it was.
#[derive(Debug, Error)]
pub enum WizardError {
    /// Done was pressed on a statement with no `INSERT`/`REPLACE` target.
    #[error("Must have an ingest datasource")]
    MissingIngestDatasource,
    /// The task service rejected the submission.
    #[error("Error submitting task: {0}")]
    Submission(String),
    #[error("persist loader snapshot: {0:#}")]
    Storage(anyhow::Error),
    #[error("generate ingestion query: {0:#}")]
    Translate(anyhow::Error),
}

/// A pending "cluster looks busy" confirmation.
///
/// Holds the submission captured when Done was pressed. Any content change
/// dismisses the alert.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityAlert {
    pub shortfall: CapacityShortfall,
    pub pending: PendingSubmission,
}

/// Everything a Done press needs, captured from the current content.
#[derive(Debug, Clone, PartialEq)]
pub struct DoneRequest {
    pub query: String,
    pub datasource: String,
}

/// What a host renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WizardView<'a> {
    pub step: Step,
    /// Task being tracked by the progress dialog, shown over the step.
    pub progress_task_id: Option<&'a str>,
    pub alert: Option<&'a CapacityAlert>,
}

pub struct Wizard {
    snapshots: SnapshotStore,
    external: ExternalConfig,
    content: Option<LoaderContent>,
    need_verify: bool,
    revision: u64,
    alert: Option<CapacityAlert>,
}

impl Wizard {
    /// Start a session from whatever the store holds.
    ///
    /// The resume question is decided here, once per session.
    pub fn open(snapshots: SnapshotStore) -> anyhow::Result<Self> {
        let content = snapshots.load()?;
        let need_verify = needs_verify(content.as_ref());
        debug!(
            has_content = content.is_some(),
            need_verify, "wizard session opened"
        );
        Ok(Self {
            snapshots,
            external: ExternalConfig::default(),
            content,
            need_verify,
            revision: 0,
            alert: None,
        })
    }

    pub fn step(&self) -> Step {
        derive_step(&self.external, self.content.as_ref(), self.need_verify)
    }

    pub fn view(&self) -> WizardView<'_> {
        WizardView {
            step: self.step(),
            progress_task_id: self.content.as_ref().and_then(|c| c.id.as_deref()),
            alert: self.alert.as_ref(),
        }
    }

    pub fn content(&self) -> Option<&LoaderContent> {
        self.content.as_ref()
    }

    pub fn external_config(&self) -> &ExternalConfig {
        &self.external
    }

    pub fn need_verify(&self) -> bool {
        self.need_verify
    }

    /// Incremented on every content replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // Resume

    /// Discard the previous flow and start over.
    pub fn start_new(&mut self) -> Result<(), WizardError> {
        self.replace_content(None)?;
        self.need_verify = false;
        debug!("resume: started new flow");
        Ok(())
    }

    /// Keep the previous flow's content and carry on editing it.
    pub fn continue_previous(&mut self) {
        self.need_verify = false;
        debug!("resume: continuing previous flow");
    }

    // Select input type

    pub fn select_input_type(&mut self, input_source: InputSource, input_format: InputFormat) {
        debug!(source = %input_source.kind, format = %input_format.kind, "input type selected");
        self.external = ExternalConfig {
            input_source: Some(input_source),
            input_format: Some(input_format),
            ..ExternalConfig::default()
        };
    }

    // Parse

    /// Generate the ingestion statement and move on to the schema step.
    ///
    /// The external config is spent once content exists.
    pub fn set_parsed_input(&mut self, input: &ParsedInput) -> Result<(), WizardError> {
        let query_string = translate(input)?;
        self.replace_content(Some(LoaderContent::new(query_string)))?;
        self.external = ExternalConfig::default();
        debug!("parse: content generated");
        Ok(())
    }

    /// Generate the statement for the free-form query view, leaving the wizard.
    ///
    /// Nothing is persisted.
    pub fn skip_wizard(&self, input: &ParsedInput) -> Result<QueryWithContext, WizardError> {
        let query_string = translate(input)?;
        Ok(QueryWithContext {
            query_string,
            query_context: None,
        })
    }

    /// Back to input selection, remembering only the input source.
    pub fn back_to_input_type(&mut self) {
        self.external = ExternalConfig {
            input_source: self.external.input_source.take(),
            ..ExternalConfig::default()
        };
        debug!("parse: back to input type");
    }

    // Schema

    pub fn change_query_string(&mut self, query_string: impl Into<String>) -> Result<(), WizardError> {
        let Some(current) = &self.content else {
            debug!("schema: query edit ignored without content");
            return Ok(());
        };
        let next = current.with_query_string(query_string);
        self.replace_content(Some(next))
    }

    pub fn change_query_context(&mut self, query_context: QueryContext) -> Result<(), WizardError> {
        let Some(current) = &self.content else {
            debug!("schema: context edit ignored without content");
            return Ok(());
        };
        let next = current.with_query_context(query_context);
        self.replace_content(Some(next))
    }

    /// Set or clear an explicit `maxNumTasks` (the concurrency side panel).
    pub fn set_max_num_tasks(&mut self, max_num_tasks: Option<u32>) -> Result<(), WizardError> {
        let Some(current) = &self.content else {
            return Ok(());
        };
        let mut context = current.query_context.clone().unwrap_or_default();
        match max_num_tasks {
            Some(n) => {
                context.insert(QueryContext::MAX_NUM_TASKS, n);
            }
            None => {
                context.remove(QueryContext::MAX_NUM_TASKS);
            }
        }
        self.change_query_context(context)
    }

    /// Current statement for the free-form query view.
    pub fn query_for_query_view(&self) -> Option<QueryWithContext> {
        self.content.as_ref().map(LoaderContent::to_query_with_context)
    }

    /// Drop the generated content and return to input selection.
    pub fn back_from_schema(&mut self) -> Result<(), WizardError> {
        self.replace_content(None)?;
        self.external = ExternalConfig::default();
        debug!("schema: back to input type");
        Ok(())
    }

    /// Validate the statement and capture what submission needs.
    ///
    /// `Ok(None)` when there is no content to submit.
    pub fn prepare_done(&self) -> Result<Option<DoneRequest>, WizardError> {
        let Some(content) = &self.content else {
            return Ok(None);
        };
        let datasource =
            ingest_table(&content.query_string).ok_or(WizardError::MissingIngestDatasource)?;
        Ok(Some(DoneRequest {
            query: content.query_string.clone(),
            datasource,
        }))
    }

    // Capacity alert

    pub fn raise_alert(&mut self, alert: CapacityAlert) {
        info!(
            max_num_tasks = alert.shortfall.max_num_tasks,
            available = alert.shortfall.capacity.available_task_slots,
            "capacity alert raised"
        );
        self.alert = Some(alert);
    }

    pub fn alert(&self) -> Option<&CapacityAlert> {
        self.alert.as_ref()
    }

    /// Remove the alert, returning it so the caller can act on it.
    pub fn take_alert(&mut self) -> Option<CapacityAlert> {
        self.alert.take()
    }

    // Submission

    /// Capture the acting content for a submission.
    ///
    /// `None` when there is no content; submitting is then a no-op.
    pub fn begin_submission(
        &self,
        query: impl Into<String>,
        context: QueryContext,
    ) -> Option<PendingSubmission> {
        let content = self.content.clone()?;
        Some(PendingSubmission::new(
            self.revision,
            content,
            query.into(),
            context,
        ))
    }

    /// Apply a finished submission.
    ///
    /// Failures leave content untouched. A success that arrives after the
    /// content changed is reported as stale and not applied.
    pub fn complete_submission(
        &mut self,
        outcome: SubmissionOutcome,
    ) -> Result<SubmissionApplied, WizardError> {
        let SubmissionOutcome {
            revision,
            content,
            result,
        } = outcome;
        let task_id = result.map_err(WizardError::Submission)?;
        if revision != self.revision {
            warn!(
                task_id = %task_id,
                submitted_revision = revision,
                current_revision = self.revision,
                "dropping submission result for superseded content"
            );
            return Ok(SubmissionApplied::Stale { task_id });
        }
        self.replace_content(Some(content.with_id(task_id.clone())))?;
        info!(task_id = %task_id, "task submitted");
        Ok(SubmissionApplied::Recorded { task_id })
    }

    // Progress tracking

    /// Close the progress dialog, keeping the statement for further edits.
    pub fn close_progress(&mut self) -> Result<(), WizardError> {
        let Some(current) = &self.content else {
            return Ok(());
        };
        if !current.is_submitted() {
            return Ok(());
        }
        let next = current.without_id();
        self.replace_content(Some(next))?;
        debug!("progress: closed");
        Ok(())
    }

    /// Throw everything away and start from input selection.
    pub fn reset_progress(&mut self) -> Result<(), WizardError> {
        self.replace_content(None)?;
        self.external = ExternalConfig::default();
        debug!("progress: reset");
        Ok(())
    }

    fn replace_content(&mut self, content: Option<LoaderContent>) -> Result<(), WizardError> {
        self.snapshots
            .save(content.as_ref())
            .map_err(WizardError::Storage)?;
        self.content = content;
        self.revision += 1;
        if self.alert.take().is_some() {
            debug!("capacity alert dismissed by content change");
        }
        Ok(())
    }
}

fn translate(input: &ParsedInput) -> Result<String, WizardError> {
    external_config_to_ingest_pattern(
        ExternalSource::from(input),
        input.time_expression.as_deref(),
        None,
        input.array_mode,
    )
    .to_query_string()
    .map_err(WizardError::Translate)
}
