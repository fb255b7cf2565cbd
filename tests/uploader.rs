mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rollsync::api::HttpApi;
use rollsync::entities::UploadStatus;
use rollsync::error::AppError;
use rollsync::repositories::AttendanceRepository;
use rollsync::storage::LocalStorage;
use rollsync::sync::BatchUploader;

const ENDPOINT: &str = "/participacion/admin/api_sync.php";

fn uploader(storage: &LocalStorage, server: &MockServer, timeout: Duration) -> BatchUploader {
    let api = HttpApi::new(format!("{}{}", server.uri(), ENDPOINT), timeout).unwrap();
    BatchUploader::new(storage.clone(), Arc::new(api)).with_pause(Duration::ZERO)
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

async fn pending_count(storage: &LocalStorage) -> u64 {
    AttendanceRepository::count_pending(storage.connection()).await.unwrap()
}

#[tokio::test]
async fn test_empty_upload_makes_no_request() {
    let storage = common::memory_storage().await;
    let server = MockServer::start().await;

    let summary = uploader(&storage, &server, Duration::from_secs(5)).upload(&[]).await.unwrap();

    assert!(summary.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_45_events_go_out_as_20_20_5_in_order() {
    let storage = common::memory_storage().await;
    let events = common::seed_pending(&storage, 20, 45).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success", "message": "ok"})))
        .expect(3)
        .mount(&server)
        .await;

    let summary = uploader(&storage, &server, Duration::from_secs(5)).upload(&events).await.unwrap();
    assert_eq!(summary.uploaded, 45);
    assert_eq!(summary.total, 45);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.to_string(), "45 of 45 uploaded");

    let bodies = request_bodies(&server).await;
    let sizes: Vec<usize> = bodies
        .iter()
        .map(|body| body["participaciones"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![20, 20, 5]);

    let sent: Vec<String> = bodies
        .iter()
        .flat_map(|body| body["participaciones"].as_array().unwrap().clone())
        .map(|p| p["id_nnaj"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = events.iter().map(|e| e.student_id.clone()).collect();
    assert_eq!(sent, expected);

    let first = &bodies[0]["participaciones"][0];
    assert_eq!(first["actividad_id"], 20);
    assert_eq!(first["fecha"], "2025-03-14");
    assert_eq!(first["uuid_registro"], events[0].client_ref.to_string());

    assert_eq!(pending_count(&storage).await, 0);
}

#[tokio::test]
async fn test_second_batch_failure_keeps_first_batch_uploaded() {
    let storage = common::memory_storage().await;
    let events = common::seed_pending(&storage, 20, 45).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html><body>Fatal error</body></html>"))
        .mount(&server)
        .await;

    let err = uploader(&storage, &server, Duration::from_secs(5)).upload(&events).await.unwrap_err();
    match &err {
        AppError::PartialUploadFailure {
            uploaded,
            total,
            failed_batch,
            total_batches,
            cause,
        } => {
            assert_eq!((*uploaded, *total), (20, 45));
            assert_eq!((*failed_batch, *total_batches), (2, 3));
            assert!(matches!(**cause, AppError::MalformedResponse { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.user_message().contains("20 of 45 uploaded"));
    assert!(err.user_message().contains("Fatal error"));

    // The third batch was never attempted
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(pending_count(&storage).await, 25);

    let all = AttendanceRepository::get_all(storage.connection()).await.unwrap();
    assert!(all[..20].iter().all(|e| e.status == UploadStatus::Uploaded));
    assert!(all[20..].iter().all(|e| e.status == UploadStatus::Pending));
}

#[tokio::test]
async fn test_error_status_under_http_200_is_a_failure() {
    let storage = common::memory_storage().await;
    let events = common::seed_pending(&storage, 20, 3).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "error", "message": "Actividad cerrada"})),
        )
        .mount(&server)
        .await;

    let err = uploader(&storage, &server, Duration::from_secs(5)).upload(&events).await.unwrap_err();
    match err {
        AppError::PartialUploadFailure { uploaded, cause, .. } => {
            assert_eq!(uploaded, 0);
            assert!(matches!(*cause, AppError::ServerRejected(ref m) if m == "Actividad cerrada"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(pending_count(&storage).await, 3);
}

#[tokio::test]
async fn test_timed_out_batch_stays_pending() {
    let storage = common::memory_storage().await;
    let events = common::seed_pending(&storage, 20, 2).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = uploader(&storage, &server, Duration::from_secs(1)).upload(&events).await.unwrap_err();
    match err {
        AppError::PartialUploadFailure { cause, .. } => assert!(matches!(*cause, AppError::Timeout(1))),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(pending_count(&storage).await, 2);
}

#[tokio::test]
async fn test_pause_between_batches() {
    let storage = common::memory_storage().await;
    let events = common::seed_pending(&storage, 20, 5).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let uploader = uploader(&storage, &server, Duration::from_secs(5))
        .with_batch_size(2)
        .with_pause(Duration::from_millis(100));
    let started = Instant::now();
    let summary = uploader.upload(&events).await.unwrap();

    assert_eq!(summary.batches, 3);
    // Two pauses: none before the first batch, none after the last
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_reuploading_uploaded_events_does_not_regress_status() {
    let storage = common::memory_storage().await;
    let events = common::seed_pending(&storage, 20, 2).await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let uploader = uploader(&storage, &server, Duration::from_secs(5));
    uploader.upload(&events).await.unwrap();
    uploader.upload(&events).await.unwrap();

    let all = AttendanceRepository::get_all(storage.connection()).await.unwrap();
    assert!(all.iter().all(|e| e.status == UploadStatus::Uploaded));
    let ids: Vec<i32> = all.iter().map(|e| e.id).collect();
    assert_eq!(AttendanceRepository::mark_uploaded(storage.connection(), &ids).await.unwrap(), 0);
}
