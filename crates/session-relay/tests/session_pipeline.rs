// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{outfiles, read_lines, MockTransport};
use serde_json::json;
use session_relay::{
    Entry, Metadata, SendError, SessionOptions, SessionRegistry, Transport, TransportError,
};
use tempfile::TempDir;

fn options() -> SessionOptions {
    SessionOptions {
        flush_delay: Duration::from_secs(60),
        rotation_threshold: 1024 * 1024,
    }
}

fn registry(dir: &TempDir, options: SessionOptions) -> SessionRegistry {
    SessionRegistry::new(dir.path(), options)
}

#[tokio::test]
async fn test_three_logs_flushed_in_order() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir, options());
    let transport = Arc::new(MockTransport::default());
    let handle = registry
        .create(transport, Metadata::new(json!({}), json!({})))
        .await
        .unwrap();

    handle.add_entry(Entry::log(json!("one"))).unwrap();
    handle.add_entry(Entry::log(json!("two"))).unwrap();
    handle.add_entry(Entry::log(json!("three"))).unwrap();
    handle.flush().await.unwrap();

    let active = registry.session_dir(handle.id()).join("entries.json");
    assert_eq!(
        read_lines(&active),
        vec![
            Entry::log(json!("one")),
            Entry::log(json!("two")),
            Entry::log(json!("three")),
        ]
    );
}

#[tokio::test]
async fn test_send_without_metadata_makes_no_call() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir, options());
    let transport = Arc::new(MockTransport::default());
    let id = uuid::Uuid::new_v4();
    std::fs::create_dir_all(registry.session_dir(id)).unwrap();
    let handle = registry.open(id, transport.clone()).unwrap();

    handle.add_entry(Entry::event(json!({"name": "tap"}))).unwrap();
    handle.flush().await.unwrap();
    let result = handle.send().await;

    assert!(matches!(result, Err(SendError::MetadataMissing)));
    assert_eq!(transport.registration_count(), 0);
    assert_eq!(transport.upload_count(), 0);
}

#[tokio::test]
async fn test_first_send_registers_then_uploads() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir, options());
    let transport = Arc::new(MockTransport::default());
    let handle = registry
        .create(
            transport.clone(),
            Metadata::new(json!({"model": "x1"}), json!({"name": "app"})),
        )
        .await
        .unwrap();

    handle.add_entry(Entry::log(json!("hello"))).unwrap();
    handle.add_entry(Entry::event(json!({"name": "open"}))).unwrap();
    handle.flush().await.unwrap();
    handle.send().await.unwrap();
    handle.send().await.unwrap();

    assert_eq!(transport.registration_count(), 1);
    assert_eq!(transport.upload_count(), 1);
    let uploads = transport.uploads.lock().unwrap();
    assert_eq!(uploads[0].1, "remote-1");
    assert_eq!(
        uploads[0].0,
        vec![Entry::log(json!("hello")), Entry::event(json!({"name": "open"}))]
    );

    let session_dir = registry.session_dir(handle.id());
    let metadata: Metadata =
        serde_json::from_slice(&std::fs::read(session_dir.join("metadata.json")).unwrap())
            .unwrap();
    assert_eq!(metadata.remote_identifier.as_deref(), Some("remote-1"));
    assert!(outfiles(&session_dir).is_empty());
}

#[tokio::test]
async fn test_failed_registration_keeps_everything_on_disk() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir, options());
    let transport = Arc::new(MockTransport::default());
    transport
        .fail_registration
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let handle = registry
        .create(transport.clone(), Metadata::new(json!({}), json!({})))
        .await
        .unwrap();

    handle.add_entry(Entry::log(json!("kept"))).unwrap();
    handle.flush().await.unwrap();
    let result = handle.send().await;

    assert!(matches!(
        result,
        Err(SendError::Transport(TransportError::UnexpectedStatus(500)))
    ));
    let session_dir = registry.session_dir(handle.id());
    assert!(session_dir.join("entries.json").exists());
    assert_eq!(transport.upload_count(), 0);
}

#[tokio::test]
async fn test_threshold_rotation_then_delivery_after_outage() {
    let dir = TempDir::new().unwrap();
    // Every flushed entry fills the active log past the threshold.
    let registry = registry(
        &dir,
        SessionOptions {
            flush_delay: Duration::from_secs(60),
            rotation_threshold: 16,
        },
    );
    let transport = Arc::new(MockTransport::default());
    let handle = registry
        .create(transport.clone(), Metadata::new(json!({}), json!({})))
        .await
        .unwrap();
    let session_dir = registry.session_dir(handle.id());

    for i in 0..3 {
        handle.add_entry(Entry::log(json!({ "seq": i }))).unwrap();
        handle.flush().await.unwrap();
    }
    assert_eq!(outfiles(&session_dir).len(), 3);
    assert!(!session_dir.join("entries.json").exists());

    transport.set_fail_uploads(true);
    assert!(handle.send().await.is_err());
    assert_eq!(outfiles(&session_dir).len(), 3);

    transport.set_fail_uploads(false);
    handle.send().await.unwrap();

    assert!(outfiles(&session_dir).is_empty());
    assert_eq!(
        transport.uploaded_entries(),
        vec![
            Entry::log(json!({"seq": 0})),
            Entry::log(json!({"seq": 1})),
            Entry::log(json!({"seq": 2})),
        ]
    );
}

#[tokio::test]
async fn test_reloaded_session_delivers_leftovers() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir, options());
    let transport = Arc::new(MockTransport::default());

    let id = {
        let handle = registry
            .create(transport.clone(), Metadata::new(json!({}), json!({})))
            .await
            .unwrap();
        handle.add_entry(Entry::log(json!("before restart"))).unwrap();
        handle.shutdown().await.unwrap();
        handle.id()
    };

    let transport_dyn: Arc<dyn Transport> = transport.clone();
    let sessions = registry.load_saved(&transport_dyn).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id(), id);
    sessions[0].send().await.unwrap();

    assert_eq!(
        transport.uploaded_entries(),
        vec![Entry::log(json!("before restart"))]
    );
}

#[tokio::test]
async fn test_debounced_flush_without_explicit_call() {
    let dir = TempDir::new().unwrap();
    let registry = registry(
        &dir,
        SessionOptions {
            flush_delay: Duration::from_millis(50),
            rotation_threshold: 1024 * 1024,
        },
    );
    let transport = Arc::new(MockTransport::default());
    let handle = registry
        .create(transport, Metadata::new(json!({}), json!({})))
        .await
        .unwrap();
    let active = registry.session_dir(handle.id()).join("entries.json");

    for i in 0..10 {
        handle.add_entry(Entry::event(json!(i))).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let expected: Vec<_> = (0..10).map(|i| Entry::event(json!(i))).collect();
    assert_eq!(read_lines(&active), expected);
}

#[tokio::test]
async fn test_purge_deletes_session() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir, options());
    let transport = Arc::new(MockTransport::default());
    let handle = registry
        .create(transport, Metadata::new(json!({}), json!({})))
        .await
        .unwrap();
    handle.add_entry(Entry::log(json!("gone"))).unwrap();
    handle.flush().await.unwrap();

    handle.purge().await.unwrap();

    assert!(!registry.session_dir(handle.id()).exists());
    assert!(registry.saved_ids().unwrap().is_empty());
    assert!(handle.add_entry(Entry::log(json!("late"))).is_err());
}
