mod common;

use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use rollsync::config::SyncConfig;
use rollsync::connectivity::{ConnectivityMonitor, HttpProbe, LinkState, NetworkProbe, NetworkState};
use rollsync::repositories::AttendanceRepository;
use rollsync::storage::LocalStorage;
use rollsync::sync::{AutoSyncOutcome, SyncService};

fn monitor(storage: &LocalStorage, api: Arc<common::FakeApi>) -> ConnectivityMonitor {
    let settings = SyncConfig {
        batch_pause_ms: 0,
        ..SyncConfig::default()
    };
    let sync = SyncService::new(storage.clone(), api, common::FakeProbe::online(), &settings);
    ConnectivityMonitor::new(sync)
}

#[test]
fn test_online_needs_connection_and_reachability() {
    assert!(NetworkState::online().is_online());
    assert!(!NetworkState::offline().is_online());
    assert!(!NetworkState {
        is_connected: true,
        is_internet_reachable: false,
    }
    .is_online());
}

#[tokio::test]
async fn test_only_offline_to_online_fires_auto_sync() {
    let storage = common::memory_storage().await;
    common::seed_session(&storage).await;
    common::seed_pending(&storage, 20, 2).await;
    let api = Arc::new(common::FakeApi::new());
    let monitor = monitor(&storage, api.clone());
    assert_eq!(monitor.state(), LinkState::Offline);

    assert!(monitor.observe(NetworkState::offline()).is_none());

    let handle = monitor.observe(NetworkState::online()).expect("reconnect should fire");
    assert!(matches!(handle.await.unwrap(), AutoSyncOutcome::Completed(_)));
    assert_eq!(monitor.state(), LinkState::Online);

    // Staying online does not fire again
    assert!(monitor.observe(NetworkState::online()).is_none());

    assert!(monitor.observe(NetworkState::offline()).is_none());
    assert_eq!(monitor.state(), LinkState::Offline);
    let handle = monitor.observe(NetworkState::online()).expect("second reconnect should fire");
    assert_eq!(handle.await.unwrap(), AutoSyncOutcome::NothingPending);

    assert_eq!(api.batch_sizes(), vec![2]);
}

#[tokio::test]
async fn test_disabled_auto_sync_still_tracks_state() {
    let storage = common::memory_storage().await;
    let monitor = monitor(&storage, Arc::new(common::FakeApi::new())).with_auto_sync(false);

    assert!(monitor.observe(NetworkState::online()).is_none());
    assert_eq!(monitor.state(), LinkState::Online);
}

#[tokio::test]
async fn test_watch_polls_probe_and_uploads_on_reconnect() {
    let storage = common::memory_storage().await;
    common::seed_session(&storage).await;
    common::seed_pending(&storage, 20, 4).await;
    let api = Arc::new(common::FakeApi::new());
    let monitor = Arc::new(monitor(&storage, api.clone()));
    let probe = common::FakeProbe::offline();

    let watcher = {
        let monitor = monitor.clone();
        let probe: Arc<dyn NetworkProbe> = probe.clone();
        tokio::spawn(async move { monitor.watch(probe, Duration::from_millis(10)).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(api.batch_sizes().is_empty());

    probe.set(NetworkState::online());
    let mut uploaded = false;
    for _ in 0..100 {
        if AttendanceRepository::count_pending(storage.connection()).await.unwrap() == 0 {
            uploaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    watcher.abort();

    assert!(uploaded);
    assert_eq!(api.batch_sizes(), vec![4]);
}

#[tokio::test]
async fn test_http_probe_treats_any_answer_as_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(&server.uri()).unwrap();
    assert!(probe.check().await.is_online());
}

#[tokio::test]
async fn test_http_probe_refused_connection_is_offline() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::with_timeout(&format!("http://{address}"), Duration::from_secs(2)).unwrap();
    assert_eq!(probe.check().await, NetworkState::offline());
}
