// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Full passes against the SQLite store.

use davsync_core::{
    DavCollection, LocalCollection, LocalDb, SyncConfig, SyncEngine, SyncStatus,
};
use davsync_dav::{AuthMethod, DavClient, DavConfig};
use davsync_entity::EntityKind;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{MemoryRemote, summary_of, task, task_ics};

#[tokio::test]
async fn mixed_pass_on_sqlite_store() {
    // Arrange: C is known on both sides, A was created locally, B remotely
    let db = LocalDb::open(None).await.unwrap();
    let local = db
        .collection("https://dav.example.com/tasks/", EntityKind::Task)
        .await
        .unwrap();
    let remote = MemoryRemote::new();
    remote.insert("c.ics", task_ics("c", "Gamma"));
    let mut engine = SyncEngine::new(local, remote, SyncConfig::default());
    engine.sync().await.unwrap();

    let a = engine.local().create(task("Alpha")).await.unwrap();
    engine.remote().insert("b.ics", task_ics("b", "Beta"));

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(!report.fast_path);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.pushed, 1);
    assert_eq!(report.status(), SyncStatus::Success);
    assert_eq!(
        engine.remote().state().puts,
        vec![(a.resource.name.clone(), None)]
    );
    assert_eq!(engine.remote().state().multi_get_calls, 2);

    let local = engine.local();
    let mut entries = local.list_all().await.unwrap();
    entries.sort_by(|x, y| x.resource.name.cmp(&y.resource.name));
    let names: Vec<&str> = entries.iter().map(|e| e.resource.name.as_str()).collect();
    let mut expected = vec![a.resource.name.as_str(), "b.ics", "c.ics"];
    expected.sort_unstable();
    assert_eq!(names, expected);
    assert!(local.list_dirty().await.unwrap().is_empty());
    assert_eq!(local.get_ctag().await.unwrap().as_deref(), Some("ctag-2"));

    let stats = local.stats().await.unwrap();
    assert_eq!(stats.live, 3);
    assert_eq!(stats.dirty, 0);
    assert!(local.record().await.unwrap().last_synced().is_some());

    // the upload moved the server tag on, so one more full diff settles it
    let report = engine.sync().await.unwrap();
    assert!(report.is_noop());
    let report = engine.sync().await.unwrap();
    assert!(report.fast_path);
    assert!(report.is_noop());
}

#[tokio::test]
async fn local_edits_survive_reopening_the_store() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("davsync.db");
    let url = "https://dav.example.com/tasks/";
    let remote = MemoryRemote::new();
    remote.insert("a.ics", task_ics("a", "Alpha"));

    let db = LocalDb::open(Some(&path)).await.unwrap();
    let local = db.collection(url, EntityKind::Task).await.unwrap();
    let mut engine = SyncEngine::new(local, remote, SyncConfig::default());
    engine.sync().await.unwrap();
    let entry = engine.local().list_all().await.unwrap().remove(0);
    engine
        .local()
        .update(entry.local_id, task("Alpha v2"))
        .await
        .unwrap();
    let (_, remote) = engine.into_parts();
    db.close().await;

    // Act
    let db = LocalDb::open(Some(&path)).await.unwrap();
    let local = db.collection(url, EntityKind::Task).await.unwrap();
    let mut engine = SyncEngine::new(local, remote, SyncConfig::default());
    let report = engine.sync().await.unwrap();

    // Assert
    assert!(report.fast_path);
    assert_eq!(report.pushed, 1);
    let body = engine.remote().body("a.ics").unwrap();
    assert!(body.contains("SUMMARY:Alpha v2"));
    let entry = engine.local().get(entry.local_id).await.unwrap().unwrap();
    assert!(!entry.dirty);
    assert_eq!(entry.resource.uid(), "a");
    assert_eq!(
        summary_of(&entry.resource.entity).as_deref(),
        Some("Alpha v2")
    );
    db.close().await;
}

const COLLECTION: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav" xmlns:CS="http://calendarserver.org/ns/">
  <D:response>
    <D:href>/dav/tasks/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>Tasks</D:displayname>
        <D:resourcetype><D:collection/><C:calendar/></D:resourcetype>
        <CS:getctag>"ctag-1"</CS:getctag>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

const MEMBERS: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/tasks/</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype><D:collection/></D:resourcetype>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/dav/tasks/a.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype/>
        <D:getetag>"1"</D:getetag>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

const MULTIGET: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/dav/tasks/a.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>"1"</D:getetag>
        <C:calendar-data>BEGIN:VCALENDAR&#13;
VERSION:2.0&#13;
BEGIN:VTODO&#13;
UID:a&#13;
SUMMARY:From the server&#13;
END:VTODO&#13;
END:VCALENDAR&#13;
</C:calendar-data>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

async fn mount(server: &MockServer, verb: &str, depth: Option<&str>, marker: &str, body: &str) {
    let mut mock = Mock::given(method(verb))
        .and(path("/dav/tasks/"))
        .and(body_string_contains(marker));
    if let Some(depth) = depth {
        mock = mock.and(header("Depth", depth));
    }
    mock.respond_with(
        ResponseTemplate::new(207).set_body_raw(body.to_string(), "application/xml"),
    )
    .mount(server)
    .await;
}

#[tokio::test]
async fn pulls_from_dav_server() {
    // Arrange
    let server = MockServer::start().await;
    mount(&server, "PROPFIND", Some("0"), "getctag", COLLECTION).await;
    mount(&server, "PROPFIND", Some("1"), "getetag", MEMBERS).await;
    mount(&server, "REPORT", None, "calendar-multiget", MULTIGET).await;

    let client = DavClient::new(DavConfig {
        base_url: server.uri(),
        auth: AuthMethod::None,
        ..Default::default()
    })
    .unwrap();
    let remote = DavCollection::new(client, "/dav/tasks/", EntityKind::Task);
    assert_eq!(remote.display_name().await.unwrap().as_deref(), Some("Tasks"));

    let db = LocalDb::open(None).await.unwrap();
    let local = db.collection("/dav/tasks/", EntityKind::Task).await.unwrap();
    let mut engine = SyncEngine::new(local, remote, SyncConfig::default());

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    assert_eq!(report.status(), SyncStatus::Success);
    let entries = engine.local().list_all().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].resource.name, "a.ics");
    assert_eq!(entries[0].resource.etag.as_deref(), Some("\"1\""));
    assert_eq!(
        summary_of(&entries[0].resource.entity).as_deref(),
        Some("From the server")
    );
    assert_eq!(
        engine.local().get_ctag().await.unwrap().as_deref(),
        Some("\"ctag-1\"")
    );

    // the stored tag matches, so nothing is listed again
    let report = engine.sync().await.unwrap();
    assert!(report.fast_path);
}

#[tokio::test]
async fn absolute_hrefs_keep_the_pass_clean() {
    // Arrange: the server answers the multiget with full URLs
    let server = MockServer::start().await;
    let multiget = MULTIGET.replace(
        "<D:href>/dav/tasks/a.ics",
        &format!("<D:href>{}/dav/tasks/a.ics", server.uri()),
    );
    mount(&server, "PROPFIND", Some("0"), "getctag", COLLECTION).await;
    mount(&server, "PROPFIND", Some("1"), "getetag", MEMBERS).await;
    mount(&server, "REPORT", None, "calendar-multiget", &multiget).await;

    let client = DavClient::new(DavConfig::new(server.uri())).unwrap();
    let remote = DavCollection::new(client, "/dav/tasks/", EntityKind::Task);
    let db = LocalDb::open(None).await.unwrap();
    let local = db.collection("/dav/tasks/", EntityKind::Task).await.unwrap();
    let mut engine = SyncEngine::new(local, remote, SyncConfig::default());

    // Act
    let report = engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.status(), SyncStatus::Success);
    assert_eq!(
        engine.local().get_ctag().await.unwrap().as_deref(),
        Some("\"ctag-1\"")
    );
    assert!(engine.sync().await.unwrap().fast_path);
}
