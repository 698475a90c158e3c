//! End-to-end wizard flows over a file-backed snapshot.
//!
//! Each test drives a `LoaderSession` through several user events, then
//! reopens the wizard from disk to check what a page reload would see.

use sql_loader::core::types::{CapacityInfo, LoaderContent, Step};
use sql_loader::gate::CapacityGate;
use sql_loader::io::snapshot::SnapshotStore;
use sql_loader::session::{DoneOutcome, LoaderSession, LoaderServices};
use sql_loader::test_support::{
    FixedCapacityProbe, RecordingNotifier, ScriptedSubmitter, TestProject, execution_record,
    parsed_wiki_input, services, wiki_format, wiki_source,
};
use sql_loader::wizard::Wizard;

fn open_session(snapshots: SnapshotStore, services: LoaderServices) -> LoaderSession {
    let wizard = Wizard::open(snapshots).expect("open wizard");
    LoaderSession::new(wizard, services, CapacityGate::default())
}

/// Full lifecycle: fresh start → submit → reload → close → resubmit with alert.
///
/// Event sequence:
/// 1. Select the wikipedia input and confirm parsing → Schema step
/// 2. Done with idle cluster → task `query-1` recorded
/// 3. Reload → progress dialog for `query-1` over the schema step
/// 4. Close progress, raise concurrency to 16, Done → capacity alert
/// 5. Run anyway → task `query-2` recorded with `maxNumTasks = 16`
#[tokio::test]
async fn full_lifecycle_submits_reloads_and_resubmits() {
    let project = TestProject::new().expect("project");
    let submitter = ScriptedSubmitter::new(vec![
        Ok(execution_record("query-1")),
        Ok(execution_record("query-2")),
    ]);
    let notifier = RecordingNotifier::default();

    let mut session = open_session(
        project.snapshots(),
        services(
            Some(4),
            Some(FixedCapacityProbe::new(Some(CapacityInfo::with_available(10)))),
            submitter.clone(),
            notifier.clone(),
        ),
    );
    assert_eq!(session.wizard().step(), Step::SelectInputType);

    session.select_input_type(wiki_source(), wiki_format());
    assert_eq!(session.wizard().step(), Step::Parse);
    session
        .set_parsed_input(&parsed_wiki_input())
        .expect("parse");
    assert_eq!(session.wizard().step(), Step::Schema);

    let outcome = session.done().await.expect("first done");
    assert_eq!(
        outcome,
        DoneOutcome::Submitted {
            task_id: "query-1".to_string()
        }
    );
    let first_query = submitter.calls()[0].0.clone();
    assert!(first_query.starts_with("REPLACE INTO \"wikipedia\" OVERWRITE ALL"));
    assert_eq!(submitter.calls()[0].1.max_num_tasks(), Some(4));
    drop(session);

    // Reload: a submitted snapshot resumes straight into progress tracking.
    let mut session = open_session(
        project.snapshots(),
        services(
            Some(4),
            Some(FixedCapacityProbe::new(Some(CapacityInfo::with_available(3)))),
            submitter.clone(),
            notifier.clone(),
        ),
    );
    assert!(!session.wizard().need_verify());
    let view = session.wizard().view();
    assert_eq!(view.step, Step::Schema);
    assert_eq!(view.progress_task_id, Some("query-1"));

    session.close_progress().expect("close progress");
    assert_eq!(session.wizard().view().progress_task_id, None);
    session
        .wizard_mut()
        .set_max_num_tasks(Some(16))
        .expect("raise concurrency");

    let outcome = session.done().await.expect("second done");
    assert_eq!(outcome, DoneOutcome::AwaitingConfirmation);
    assert_eq!(submitter.calls().len(), 1);

    let outcome = session.run_anyway().await.expect("run anyway");
    assert_eq!(
        outcome,
        DoneOutcome::Submitted {
            task_id: "query-2".to_string()
        }
    );
    let calls = submitter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, first_query);
    assert_eq!(calls[1].1.max_num_tasks(), Some(16));
    assert!(notifier.messages().is_empty());

    let stored = project
        .snapshots()
        .load()
        .expect("load")
        .expect("snapshot");
    assert_eq!(stored.id.as_deref(), Some("query-2"));
    assert_eq!(
        stored.query_context.and_then(|c| c.max_num_tasks()),
        Some(16)
    );
}

/// An unsubmitted snapshot asks to resume; continuing keeps the edits.
#[tokio::test]
async fn reload_mid_edit_resumes_into_schema() {
    let project = TestProject::new().expect("project");
    let mut session = open_session(
        project.snapshots(),
        services(
            None,
            None,
            ScriptedSubmitter::new(Vec::new()),
            RecordingNotifier::default(),
        ),
    );
    session.select_input_type(wiki_source(), wiki_format());
    session
        .set_parsed_input(&parsed_wiki_input())
        .expect("parse");
    session
        .wizard_mut()
        .change_query_string("REPLACE INTO \"edited\" OVERWRITE ALL SELECT 1")
        .expect("edit");
    drop(session);

    let mut session = open_session(
        project.snapshots(),
        services(
            None,
            None,
            ScriptedSubmitter::new(Vec::new()),
            RecordingNotifier::default(),
        ),
    );
    assert_eq!(session.wizard().step(), Step::Resume);
    session.continue_previous();
    assert_eq!(session.wizard().step(), Step::Schema);
    assert_eq!(
        session.wizard().content(),
        Some(&LoaderContent::new(
            "REPLACE INTO \"edited\" OVERWRITE ALL SELECT 1"
        ))
    );
}

/// Starting over from the resume prompt deletes the snapshot on disk.
#[tokio::test]
async fn reload_then_start_new_discards_snapshot() {
    let project = TestProject::new().expect("project");
    project
        .snapshots()
        .save(Some(&LoaderContent::new("REPLACE INTO t OVERWRITE ALL SELECT 1")))
        .expect("seed");

    let mut session = open_session(
        project.snapshots(),
        services(
            None,
            None,
            ScriptedSubmitter::new(Vec::new()),
            RecordingNotifier::default(),
        ),
    );
    assert_eq!(session.wizard().step(), Step::Resume);
    session.start_new().expect("start new");
    assert_eq!(session.wizard().step(), Step::SelectInputType);
    assert_eq!(project.snapshots().load().expect("load"), None);

    let session = open_session(
        project.snapshots(),
        services(
            None,
            None,
            ScriptedSubmitter::new(Vec::new()),
            RecordingNotifier::default(),
        ),
    );
    assert_eq!(session.wizard().step(), Step::SelectInputType);
}

/// A submission that resolves after the user reset the flow leaves no trace.
#[tokio::test]
async fn late_submission_after_reset_is_dropped() {
    let project = TestProject::new().expect("project");
    project
        .snapshots()
        .save(Some(&LoaderContent::new("REPLACE INTO t OVERWRITE ALL SELECT 1")))
        .expect("seed");
    let mut wizard = Wizard::open(project.snapshots()).expect("open");
    wizard.continue_previous();

    let pending = wizard
        .begin_submission(
            "REPLACE INTO t OVERWRITE ALL SELECT 1",
            Default::default(),
        )
        .expect("pending");
    wizard.reset_progress().expect("reset");

    let submitter = ScriptedSubmitter::new(vec![Ok(execution_record("query-late"))]);
    let outcome = pending.run(&submitter).await;
    let applied = wizard.complete_submission(outcome).expect("complete");
    assert_eq!(applied.task_id(), "query-late");
    assert_eq!(wizard.step(), Step::SelectInputType);
    assert_eq!(project.snapshots().load().expect("load"), None);
}
