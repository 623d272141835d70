// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Downloading server state into the local collection.

use davsync_core::{SyncConfig, SyncEngine, SyncPhase, SyncStatus};
use davsync_entity::EntityKind;

use crate::common::{MemoryLocal, MemoryRemote, contact_vcf, summary_of, task_engine, task_ics};

#[tokio::test]
async fn first_pass_downloads_everything() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", task_ics("b", "Beta"));
    remote.insert("c.ics", task_ics("c", "Gamma"));
    let mut engine = task_engine(remote);

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(!report.fast_path);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.status(), SyncStatus::Success);
    assert_eq!(report.phase, SyncPhase::Done);
    assert_eq!(engine.phase(), SyncPhase::Done);

    let local = engine.local();
    assert_eq!(local.names(), vec!["a.ics", "b.ics", "c.ics"]);
    let b = local.find("b.ics").unwrap();
    assert!(!b.dirty);
    assert_eq!(b.resource.etag, engine.remote().etag("b.ics"));
    assert_eq!(summary_of(&b.resource.entity).as_deref(), Some("Beta"));
    assert_eq!(local.ctag(), Some("ctag-3"));
}

#[tokio::test]
async fn second_pass_takes_fast_path() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    let mutations = engine.local().mutations;

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(report.fast_path);
    assert!(report.is_noop());
    assert_eq!(engine.local().mutations, mutations);
    let state = engine.remote().state();
    assert_eq!(state.list_calls, 1);
    assert_eq!(state.multi_get_calls, 1);
    assert!(state.puts.is_empty());
}

#[tokio::test]
async fn second_pass_without_ctag_changes_nothing() {
    // Arrange
    let remote = MemoryRemote::without_ctag();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", task_ics("b", "Beta"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();
    let mutations = engine.local().mutations;

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(!report.fast_path);
    assert!(report.is_noop());
    assert_eq!(report.fetched, 0);
    assert_eq!(engine.local().mutations, mutations);
    assert_eq!(engine.local().ctag(), None);
    let state = engine.remote().state();
    assert_eq!(state.list_calls, 2);
    assert_eq!(state.multi_get_calls, 1);
}

#[tokio::test]
async fn remote_changes_are_pulled() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));
    remote.insert("b.ics", task_ics("b", "Beta"));
    remote.insert("c.ics", task_ics("c", "Gamma"));
    let mut engine = task_engine(remote);
    engine.sync().await.unwrap();

    engine.remote().insert("b.ics", task_ics("b", "Beta v2"));
    engine.remote().remove("c.ics");
    engine.remote().insert("d.ics", task_ics("d", "Delta"));

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.deleted, 1);
    let local = engine.local();
    assert_eq!(local.names(), vec!["a.ics", "b.ics", "d.ics"]);
    let b = local.find("b.ics").unwrap();
    assert_eq!(summary_of(&b.resource.entity).as_deref(), Some("Beta v2"));
    assert_eq!(b.resource.etag, engine.remote().etag("b.ics"));
}

#[tokio::test]
async fn fetches_in_batches() {
    // Arrange
    let remote = MemoryRemote::new();
    for i in 0..7 {
        remote.insert(&format!("{i}.ics"), task_ics(&i.to_string(), "Item"));
    }
    let config = SyncConfig {
        multiget_batch_size: 3,
    };
    let mut engine = SyncEngine::new(MemoryLocal::new(EntityKind::Task), remote, config);

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 7);
    assert_eq!(engine.remote().state().multi_get_calls, 3);
}

#[tokio::test]
async fn pulls_contacts() {
    // Arrange
    let remote = MemoryRemote::new();
    remote.insert("jane.vcf", contact_vcf("jane", "Jane Doe"));
    let mut engine = SyncEngine::new(
        MemoryLocal::new(EntityKind::Contact),
        remote,
        SyncConfig::default(),
    );

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    let jane = engine.local().find("jane.vcf").unwrap();
    assert_eq!(jane.resource.uid(), "jane");
    assert_eq!(summary_of(&jane.resource.entity).as_deref(), Some("Jane Doe"));
}
