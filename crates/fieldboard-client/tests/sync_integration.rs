//! Integration tests for the API client and sync engine against a mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fieldboard_client::{RetryConfig, SyncEngine, SyncEvent, TaskClient, TaskSyncState};
use fieldboard_core::protocol::{TaskDraft, TaskPatch};
use fieldboard_core::task::TaskStatus;
use fieldboard_core::ClientConfig;

/// Client with a fast retry policy so tests do not sleep for real seconds.
fn test_client(server: &MockServer) -> TaskClient {
    TaskClient::with_retry_config(&server.uri(), RetryConfig::new(2, 10)).unwrap()
}

fn task_json(id: i64, title: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "desc",
        "location": "yard",
        "status": status,
        "image": null,
    })
}

async fn mount_task_list(server: &MockServer, tasks: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_status_update_retries_on_server_error() {
    let server = MockServer::start().await;

    // First attempt fails with a 5xx, the retry succeeds
    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .and(body_json(json!({ "status": "In Progress" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updated": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let updated = client.update_status(1, TaskStatus::InProgress).await.unwrap();
    assert_eq!(updated, 1);
}

#[tokio::test]
async fn test_status_update_does_not_retry_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid status" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .update_status(1, TaskStatus::Completed)
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("Invalid status"));
}

#[tokio::test]
async fn test_status_update_fails_after_exhausting_retries() {
    let server = MockServer::start().await;

    // 1 initial attempt + 2 retries, all failing
    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .update_status(1, TaskStatus::Completed)
        .await
        .unwrap_err();
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_configured_retry_count_drives_attempts() {
    let server = MockServer::start().await;

    // 1 initial attempt + the 4 configured retries, all failing
    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&server)
        .await;

    let config = ClientConfig {
        api_url: server.uri(),
        status_retries: 4,
        retry_backoff_ms: 10,
        ..ClientConfig::default()
    };
    let client = TaskClient::from_config(&config).unwrap();

    let err = client
        .update_status(1, TaskStatus::Completed)
        .await
        .unwrap_err();
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_move_task_reverts_when_transition_fails() {
    let server = MockServer::start().await;

    // The server never accepts the move, and keeps reporting the old status
    mount_task_list(&server, json!([task_json(1, "Recon", "New Tasks")])).await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (engine, _board_rx, mut events_rx) = SyncEngine::new(test_client(&server));
    engine.refresh().await.unwrap();

    engine.move_task(1, TaskStatus::Completed).await;

    // A failure event names the task
    let event = events_rx.recv().await.unwrap();
    match event {
        SyncEvent::TransitionFailed { task_id, title, .. } => {
            assert_eq!(task_id, 1);
            assert_eq!(title, "Recon");
        }
        other => panic!("expected TransitionFailed, got {other:?}"),
    }

    // The forced refresh reverted the optimistic move
    let snapshot = engine.snapshot();
    assert_eq!(snapshot[0].task.status, TaskStatus::NewTasks);
    assert_eq!(snapshot[0].state, TaskSyncState::Synced);
}

#[tokio::test]
async fn test_move_task_converges_on_success() {
    let server = MockServer::start().await;

    // The refreshed list already reflects the accepted move
    mount_task_list(&server, json!([task_json(1, "Recon", "Completed")])).await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updated": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let (engine, _board_rx, _events_rx) = SyncEngine::new(test_client(&server));
    engine.refresh().await.unwrap();
    engine.move_task(1, TaskStatus::Completed).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot[0].task.status, TaskStatus::Completed);
    assert_eq!(snapshot[0].state, TaskSyncState::Synced);
}

#[tokio::test]
async fn test_submit_edit_merges_server_row() {
    let server = MockServer::start().await;

    mount_task_list(&server, json!([task_json(1, "Recon", "New Tasks")])).await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/1"))
        .and(body_json(json!({ "location": "sector 5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updated": 1,
            "task": {
                "id": 1,
                "title": "Recon",
                "description": "desc",
                "location": "sector 5",
                "status": "New Tasks",
                "image": null,
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (engine, _board_rx, _events_rx) = SyncEngine::new(test_client(&server));
    engine.refresh().await.unwrap();

    let patch = TaskPatch {
        location: Some("sector 5".to_string()),
        ..TaskPatch::default()
    };
    engine.submit_edit(1, patch).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot[0].task.location, "sector 5");
    assert_eq!(snapshot[0].state, TaskSyncState::Synced);
}

#[tokio::test]
async fn test_submit_edit_rejection_surfaces_and_reverts() {
    let server = MockServer::start().await;

    mount_task_list(&server, json!([task_json(1, "Recon", "New Tasks")])).await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "title cannot be empty" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (engine, _board_rx, mut events_rx) = SyncEngine::new(test_client(&server));
    engine.refresh().await.unwrap();

    let patch = TaskPatch {
        title: Some("".to_string()),
        ..TaskPatch::default()
    };
    let err = engine.submit_edit(1, patch).await.unwrap_err();
    assert!(err.is_client_error());

    let event = events_rx.recv().await.unwrap();
    assert!(matches!(event, SyncEvent::MutationFailed { .. }));

    // Refresh restored the server's row
    let snapshot = engine.snapshot();
    assert_eq!(snapshot[0].task.title, "Recon");
    assert_eq!(snapshot[0].state, TaskSyncState::Synced);
}

#[tokio::test]
async fn test_create_then_refresh_shows_new_task() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_list(&server, json!([task_json(7, "New job", "New Tasks")])).await;

    let (engine, _board_rx, _events_rx) = SyncEngine::new(test_client(&server));
    let draft = TaskDraft {
        title: "New job".to_string(),
        description: "desc".to_string(),
        location: "yard".to_string(),
        status: None,
        image: None,
    };

    let id = engine.submit_create(&draft).await.unwrap();
    assert_eq!(id, 7);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].task.id, 7);
}

#[tokio::test]
async fn test_delete_task_removes_from_board() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/tasks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": 1 })))
        .expect(1)
        .mount(&server)
        .await;
    mount_task_list(&server, json!([task_json(2, "Other", "New Tasks")])).await;

    let (engine, _board_rx, _events_rx) = SyncEngine::new(test_client(&server));
    engine.refresh().await.unwrap();

    let deleted = engine.delete_task(1).await.unwrap();
    assert_eq!(deleted, 1);

    let snapshot = engine.snapshot();
    assert!(snapshot.iter().all(|e| e.task.id != 1));
}

#[tokio::test]
async fn test_create_rejection_surfaces_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "description cannot be empty" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let draft = TaskDraft {
        title: "Recon".to_string(),
        description: "".to_string(),
        location: "yard".to_string(),
        status: None,
        image: None,
    };

    let err = client.create_task(&draft).await.unwrap_err();
    assert!(err.to_string().contains("description cannot be empty"));
}

#[tokio::test]
async fn test_comment_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/comments"))
        .and(body_json(json!({ "task_id": 1, "content": "looks done" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 3 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "task_id": 1, "content": "looks done" },
        ])))
        .mount(&server)
        .await;

    let mut panel = fieldboard_client::CommentPanel::new(test_client(&server), 1);
    panel.add("looks done").await.unwrap();

    assert_eq!(panel.comments().len(), 1);
    assert_eq!(panel.comments()[0].content, "looks done");
}

#[tokio::test]
async fn test_comment_panel_skips_blank_input() {
    let server = MockServer::start().await;
    // No POST mock mounted: a request would fail the test

    let mut panel = fieldboard_client::CommentPanel::new(test_client(&server), 1);
    panel.add("   ").await.unwrap();
    assert!(panel.comments().is_empty());
}
