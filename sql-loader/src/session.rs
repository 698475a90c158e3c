//! Async driver connecting the wizard to its collaborators.
//!
//! A [`LoaderSession`] handles one user event at a time: it calls the wizard
//! transition, performs the remote calls the event needs, and turns failures
//! into notifications. Hosts that need to keep the UI responsive while a
//! submission is in flight can use the split API on
//! [`Wizard`](crate::wizard::Wizard) directly instead.

use tracing::{debug, info};

use crate::core::capacity::GateDecision;
use crate::core::types::{
    InputFormat, InputSource, Intent, ParsedInput, QueryContext, QueryWithContext,
};
use crate::gate::CapacityGate;
use crate::io::services::{Capabilities, CapacityProbe, Navigator, Notifier, TaskSubmitter};
use crate::submit::{PendingSubmission, SubmissionApplied};
use crate::wizard::{CapacityAlert, Wizard, WizardError};

/// The collaborators a session calls out to.
pub struct LoaderServices {
    pub capabilities: Box<dyn Capabilities>,
    /// `None` when the cluster cannot report live capacity.
    pub capacity_probe: Option<Box<dyn CapacityProbe>>,
    pub submitter: Box<dyn TaskSubmitter>,
    pub notifier: Box<dyn Notifier>,
    pub navigator: Box<dyn Navigator>,
}

/// What happened after Done (or "run anyway").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneOutcome {
    /// A task was submitted and its id recorded; progress tracking is active.
    Submitted { task_id: String },
    /// The cluster looks busy; a capacity alert awaits the user.
    AwaitingConfirmation,
    /// There was nothing to submit, or the result arrived for stale content.
    Skipped,
}

pub struct LoaderSession {
    wizard: Wizard,
    services: LoaderServices,
    gate: CapacityGate,
}

impl LoaderSession {
    pub fn new(wizard: Wizard, services: LoaderServices, gate: CapacityGate) -> Self {
        Self {
            wizard,
            services,
            gate,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn into_wizard(self) -> Wizard {
        self.wizard
    }

    // Resume

    pub fn start_new(&mut self) -> Result<(), WizardError> {
        self.wizard.start_new()
    }

    pub fn continue_previous(&mut self) {
        self.wizard.continue_previous();
    }

    // Input type and parse

    pub fn select_input_type(&mut self, input_source: InputSource, input_format: InputFormat) {
        self.wizard.select_input_type(input_source, input_format);
    }

    pub fn set_parsed_input(&mut self, input: &ParsedInput) -> Result<(), WizardError> {
        self.wizard.set_parsed_input(input)
    }

    /// Leave the wizard with the generated statement open in the query view.
    pub fn skip_wizard(&mut self, input: &ParsedInput) -> Result<(), WizardError> {
        let query = self.wizard.skip_wizard(input)?;
        debug!("leaving wizard for query view");
        self.services.navigator.go_to_query(query);
        Ok(())
    }

    pub fn back_to_input_type(&mut self) {
        self.wizard.back_to_input_type();
    }

    // Schema

    pub fn open_in_query_view(&self) {
        if let Some(query) = self.wizard.query_for_query_view() {
            self.services.navigator.go_to_query(query);
        }
    }

    /// Validate, check capacity, and submit (or ask first).
    pub async fn done(&mut self) -> Result<DoneOutcome, WizardError> {
        let max_slots_hint = self.services.capabilities.max_task_slots();
        let request = match self.wizard.prepare_done() {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(DoneOutcome::Skipped),
            Err(err) => return Err(self.report(err)),
        };
        info!(datasource = %request.datasource, "schema step done");

        let query_context = self
            .wizard
            .content()
            .and_then(|content| content.query_context.clone());
        let decision = self
            .gate
            .evaluate(
                query_context.as_ref(),
                max_slots_hint,
                self.services.capacity_probe.as_deref(),
            )
            .await;

        match decision {
            GateDecision::Proceed { effective_context } => {
                self.submit_task(request.query, effective_context).await
            }
            GateDecision::Confirm(shortfall) => {
                let Some(pending) = self
                    .wizard
                    .begin_submission(request.query, shortfall.effective_context.clone())
                else {
                    return Ok(DoneOutcome::Skipped);
                };
                self.wizard.raise_alert(CapacityAlert { shortfall, pending });
                Ok(DoneOutcome::AwaitingConfirmation)
            }
        }
    }

    /// Submit despite the capacity alert.
    ///
    /// Sends exactly what was captured at Done. An edit since then dismissed
    /// the alert, so this is a no-op.
    pub async fn run_anyway(&mut self) -> Result<DoneOutcome, WizardError> {
        let Some(alert) = self.wizard.take_alert() else {
            return Ok(DoneOutcome::Skipped);
        };
        self.run_pending(alert.pending).await
    }

    /// Dismiss the capacity alert without submitting.
    pub fn cancel_alert(&mut self) {
        if self.wizard.take_alert().is_some() {
            debug!("capacity alert dismissed");
        }
    }

    /// Submit `query` for the current content and record the task id.
    pub async fn submit_task(
        &mut self,
        query: String,
        context: QueryContext,
    ) -> Result<DoneOutcome, WizardError> {
        let Some(pending) = self.wizard.begin_submission(query, context) else {
            debug!("submission skipped: no active content");
            return Ok(DoneOutcome::Skipped);
        };
        self.run_pending(pending).await
    }

    async fn run_pending(&mut self, pending: PendingSubmission) -> Result<DoneOutcome, WizardError> {
        let outcome = pending.run(self.services.submitter.as_ref()).await;
        match self.wizard.complete_submission(outcome) {
            Ok(SubmissionApplied::Recorded { task_id }) => Ok(DoneOutcome::Submitted { task_id }),
            Ok(SubmissionApplied::Stale { .. }) => Ok(DoneOutcome::Skipped),
            Err(err) => Err(self.report(err)),
        }
    }

    // Progress tracking

    pub fn go_to_task(&self) {
        if let Some(task_id) = self.wizard.view().progress_task_id {
            self.services.navigator.go_to_task(task_id);
        }
    }

    pub fn go_to_task_group(&self, task_group_id: &str) {
        self.services.navigator.go_to_task_group(task_group_id);
    }

    /// Open the submitted statement in the query view.
    pub fn go_to_query(&self, query: QueryWithContext) {
        self.services.navigator.go_to_query(query);
    }

    pub fn close_progress(&mut self) -> Result<(), WizardError> {
        self.wizard.close_progress()
    }

    pub fn reset_progress(&mut self) -> Result<(), WizardError> {
        self.wizard.reset_progress()
    }

    fn report(&self, err: WizardError) -> WizardError {
        self.services.notifier.show(&err.to_string(), Intent::Danger);
        err
    }
}
