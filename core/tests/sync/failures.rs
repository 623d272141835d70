// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Per-item failures, aborted passes and recovery.

use davsync_core::{SyncError, SyncPhase, SyncStatus};

use crate::common::{
    MemoryRemote, decode_task, summary_of, task, task_engine, task_ics, task_ics_without_uid,
};

const NOT_A_CALENDAR: &str = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Nobody\r\nEND:VCARD\r\n";

#[tokio::test]
async fn undecodable_member_is_skipped() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", NOT_A_CALENDAR);
    remote.insert("c.ics", task_ics("c", "Gamma"));
    let mut engine = task_engine(remote);

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.status(), SyncStatus::Partial);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].name, "b.ics");
    assert!(matches!(report.errors[0].error, SyncError::Entity(_)));
    assert_eq!(engine.local().names(), vec!["a.ics", "c.ics"]);
    assert_eq!(engine.local().ctag(), None);
}

#[tokio::test]
async fn skipped_member_is_retried_next_pass() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("broken.ics", NOT_A_CALENDAR);
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    engine
        .remote()
        .insert("broken.ics", task_ics("fixed", "Fixed"));

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    assert_eq!(report.status(), SyncStatus::Success);
    assert_eq!(engine.local().names(), vec!["a.ics", "broken.ics"]);
    assert_eq!(engine.local().ctag(), Some("ctag-3"));
}

#[tokio::test]
async fn member_without_uid_gets_one_and_is_pushed_back() {
    // Arrange
    let remote = MemoryRemote::new();
    let etag = remote.insert("x.ics", task_ics_without_uid("Anonymous"));
    let mut engine = task_engine(remote);

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    assert_eq!(report.pushed, 1);
    assert_eq!(report.status(), SyncStatus::Success);
    assert_eq!(
        engine.remote().state().puts,
        vec![("x.ics".to_string(), Some(etag))]
    );

    let entry = engine.local().find("x.ics").unwrap();
    assert!(!entry.dirty);
    assert!(!entry.resource.uid().is_empty());

    let uploaded = decode_task(&engine.remote().body("x.ics").unwrap());
    assert_eq!(uploaded.uid(), entry.resource.uid());
    assert_eq!(summary_of(&uploaded).as_deref(), Some("Anonymous"));
}

#[tokio::test]
async fn member_missing_from_multiget_is_skipped() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", task_ics("b", "Beta"));
    remote
        .state()
        .drop_from_multiget
        .insert("b.ics".to_string());
    let mut engine = task_engine(remote);

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.errors.is_empty());
    assert_eq!(report.status(), SyncStatus::Partial);
    assert_eq!(engine.local().names(), vec!["a.ics"]);
    assert_eq!(engine.local().ctag(), None);
}

#[tokio::test]
async fn transport_failure_aborts_without_local_changes() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.state().fail_listing = true;
    let mut engine = task_engine(remote);

    // Act
    let result = engine.sync().await;

    // Assert
    assert!(matches!(result, Err(SyncError::Transport(_))));
    assert_eq!(engine.phase(), SyncPhase::Aborted);
    assert_eq!(engine.local().len(), 0);
    assert_eq!(engine.local().mutations, 0);
    assert_eq!(engine.local().ctag(), None);
}

#[tokio::test]
async fn rejected_upload_stays_dirty() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Original"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    engine.local_mut().edit("a.ics", task("Local"));
    engine.remote().state().reject_on.insert("a.ics".to_string());

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed, 0);
    assert_eq!(report.conflicts, 0);
    assert_eq!(report.status(), SyncStatus::Partial);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors[0].error,
        SyncError::Rejected { status: 403, .. }
    ));
    assert!(engine.local().find("a.ics").unwrap().dirty);

    // once the server accepts it, the edit goes through
    engine.remote().state().reject_on.clear();
    let report = engine.sync().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(report.status(), SyncStatus::Success);
    assert!(!engine.local().find("a.ics").unwrap().dirty);
}

#[tokio::test]
async fn cancelled_pass_does_nothing() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    let mut engine = task_engine(remote);
    engine.cancel_handle().cancel();

    // Act
    let result = engine.sync().await;

    // Assert
    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert_eq!(SyncStatus::of(&result), SyncStatus::Failure);
    assert!(result.unwrap_err().aborts_pass());
    assert_eq!(engine.phase(), SyncPhase::Aborted);
    assert_eq!(engine.remote().state().list_calls, 0);
    assert_eq!(engine.local().len(), 0);
}

#[tokio::test]
async fn failed_commit_leaves_no_partial_state() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", task_ics("b", "Beta"));
    let mut engine = task_engine(remote);
    engine.local_mut().fail_next_commit = true;

    // Act
    let result = engine.sync().await;

    // Assert
    assert!(matches!(result, Err(SyncError::LocalStorage(_))));
    assert_eq!(engine.phase(), SyncPhase::Aborted);
    assert_eq!(engine.local().len(), 0);
    assert_eq!(engine.local().ctag(), None);

    // the next pass starts over and succeeds
    let report = engine.sync().await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(engine.local().names(), vec!["a.ics", "b.ics"]);
}
