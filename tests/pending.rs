mod common;

use rollsync::entities::UploadStatus;
use rollsync::sync::{BulkRefresh, PendingTracker};
use std::sync::Arc;

#[tokio::test]
async fn test_count_pending_by_activity_covers_every_activity_of_the_period() {
    let storage = common::memory_storage().await;
    BulkRefresh::new(storage.clone(), Arc::new(common::FakeApi::new()))
        .apply(common::IDENTITY, common::snapshot())
        .await
        .unwrap();

    common::seed_pending(&storage, 20, 3).await;
    common::insert_event(&storage, 20, "S010", "2025-03-10", UploadStatus::Uploaded).await;
    common::insert_event(&storage, 10, "S001", "2025-02-10", UploadStatus::Pending).await;

    let tracker = PendingTracker::new(storage.clone());
    let counts = tracker.count_pending_by_activity(2).await.unwrap();

    let summary: Vec<(i64, i64)> = counts.iter().map(|row| (row.activity_id, row.pending)).collect();
    assert_eq!(summary, vec![(20, 3), (21, 0)]);
    assert_eq!(counts[0].name, "Feria");
}

#[tokio::test]
async fn test_unknown_period_has_no_rows() {
    let storage = common::memory_storage().await;
    let tracker = PendingTracker::new(storage);
    assert!(tracker.count_pending_by_activity(99).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_all_pending_skips_uploaded_and_keeps_capture_order() {
    let storage = common::memory_storage().await;
    let first = common::insert_event(&storage, 21, "S005", "2025-03-14", UploadStatus::Pending).await;
    common::insert_event(&storage, 20, "S001", "2025-03-14", UploadStatus::Uploaded).await;
    let third = common::insert_event(&storage, 20, "S002", "2025-03-15", UploadStatus::Pending).await;

    let tracker = PendingTracker::new(storage);
    let pending = tracker.list_all_pending().await.unwrap();

    let ids: Vec<i32> = pending.iter().map(|event| event.id).collect();
    assert_eq!(ids, vec![first.id, third.id]);
    assert_eq!(tracker.count_pending().await.unwrap(), 2);
}

#[tokio::test]
async fn test_list_pending_for_activity() {
    let storage = common::memory_storage().await;
    common::seed_pending(&storage, 20, 2).await;
    common::insert_event(&storage, 21, "S009", "2025-03-14", UploadStatus::Pending).await;

    let tracker = PendingTracker::new(storage);
    let pending = tracker.list_pending_for_activity(21).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].student_id, "S009");
}
