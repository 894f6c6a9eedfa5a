use axum::http::StatusCode;
use eduportal_backend::{
    config::StorageBackend,
    db::FileDocumentStore,
};
use serde_json::json;
use std::sync::Arc;

mod support;

use support::{test_config, TestApp};

async fn file_app(dir: &std::path::Path) -> TestApp {
    let mut config = test_config();
    config.storage_backend = StorageBackend::File;
    config.data_dir = dir.to_path_buf();
    let store = FileDocumentStore::open(dir).await.expect("open data dir");
    TestApp::with_store(Arc::new(store), config).await
}

#[tokio::test]
async fn records_survive_restart_but_sessions_do_not() {
    let dir = tempfile::tempdir().unwrap();

    let first = file_app(dir.path()).await;
    let admin = first.admin_token().await;
    let (id, username) = first.create_student(&admin, "Disk Kid", "E").await;
    assert!(dir.path().join("students.json").exists());
    assert!(dir.path().join("users.json.backup").exists());

    let second = file_app(dir.path()).await;
    let (status, _) = second
        .call("GET", "/api/students/list", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = second.admin_token().await;
    let (status, body) = second
        .call("GET", &format!("/api/students/{}/view", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student"]["login_id"], username.as_str());
    second.login(&username, "stud123").await;
}

#[tokio::test]
async fn corrupt_collection_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.json"), "{ definitely not json").unwrap();

    let app = file_app(dir.path()).await;
    let admin = app.admin_token().await;
    let (status, body) = app.call("GET", "/api/events/list", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [], "total": 0 }));
}
