// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Uploading local changes.

use crate::common::{MemoryRemote, decode_task, summary_of, task, task_engine, task_ics};

#[tokio::test]
async fn local_creation_is_uploaded() {
    // Arrange
    let mut engine = task_engine(MemoryRemote::new());
    engine.sync().await.unwrap();
    let created = engine.local_mut().create(task("Buy milk"));
    let name = created.resource.name.clone();

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(report.fast_path);
    assert_eq!(report.pushed, 1);
    assert_eq!(engine.remote().state().puts, vec![(name.clone(), None)]);

    let body = engine.remote().body(&name).unwrap();
    let uploaded = decode_task(&body);
    assert_eq!(uploaded.uid(), created.resource.uid());
    assert_eq!(summary_of(&uploaded).as_deref(), Some("Buy milk"));

    let entry = engine.local().find(&name).unwrap();
    assert!(!entry.dirty);
    assert_eq!(entry.resource.etag, engine.remote().etag(&name));
}

#[tokio::test]
async fn pass_after_upload_is_noop() {
    // Arrange
    let mut engine = task_engine(MemoryRemote::new());
    engine.local_mut().create(task("Buy milk"));
    engine.sync().await.unwrap();

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(report.is_noop());
    assert_eq!(engine.remote().state().puts.len(), 1);
}

#[tokio::test]
async fn local_edit_is_conditional_on_known_etag() {
    // Arrange
    let remote = MemoryRemote::new();
    let etag = remote.insert("a.ics", task_ics("a", "Original"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    engine.local_mut().edit("a.ics", task("Edited"));

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed, 1);
    assert_eq!(
        engine.remote().state().puts,
        vec![("a.ics".to_string(), Some(etag.clone()))]
    );

    let uploaded = decode_task(&engine.remote().body("a.ics").unwrap());
    assert_eq!(uploaded.uid(), "a");
    assert_eq!(summary_of(&uploaded).as_deref(), Some("Edited"));

    let entry = engine.local().find("a.ics").unwrap();
    assert!(!entry.dirty);
    assert_ne!(entry.resource.etag, Some(etag));
    assert_eq!(entry.resource.etag, engine.remote().etag("a.ics"));
}

#[tokio::test]
async fn local_deletion_is_propagated() {
    // Arrange
    let remote = MemoryRemote::new();
    let etag = remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", task_ics("b", "Beta"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    engine.local_mut().remove("a.ics");

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed, 1);
    assert_eq!(
        engine.remote().state().deletes,
        vec![("a.ics".to_string(), Some(etag))]
    );
    assert_eq!(engine.remote().names(), vec!["b.ics"]);
    assert!(engine.local().find("a.ics").is_none());
}

#[tokio::test]
async fn tombstone_already_gone_remotely_is_purged() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    engine.local_mut().remove("a.ics");
    engine.remote().remove("a.ics");

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.deleted, 1);
    assert_eq!(report.pushed, 0);
    assert!(engine.remote().state().deletes.is_empty());
    assert_eq!(engine.local().len(), 0);
}
