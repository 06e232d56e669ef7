//! Health monitor and reconnection behavior under paused time.

mod common;

use std::time::Duration;

use tokio::time::{self, Instant};

use common::{manager, up, wait_for, Behavior, MockNet};
use rpc_manager::{ConnectionError, ConnectionEvent, NetworkConfig, ReconnectOutcome};

const A: &str = "https://a.rpc.test";
const B: &str = "https://b.rpc.test";
const P: &str = "https://polygon-1.rpc.test";
const Q: &str = "https://polygon-2.rpc.test";

#[tokio::test(start_paused = true)]
async fn test_reconnect_gives_up_after_max_attempts() {
    let net = MockNet::new();
    net.set(A, up(1));
    let manager = manager(&net);
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    manager.start_health_monitoring();
    time::sleep(Duration::from_secs(1)).await;
    assert!(manager.is_network_healthy("mainnet"));

    net.set(A, Behavior::Down);

    let mut failed_cycles = 0;
    let attempts = loop {
        match wait_for(&mut events, |_| true).await {
            ConnectionEvent::FailoverFailed { .. } => failed_cycles += 1,
            ConnectionEvent::ReconnectionFailed { attempts, .. } => break attempts,
            other => panic!("unexpected event: {other:?}"),
        }
    };
    assert_eq!(failed_cycles, 5);
    assert_eq!(attempts, 5);
    assert_eq!(net.opens(A), 6);

    // Further failing ticks probe nothing.
    let event = wait_for(&mut events, |_| true).await;
    assert!(matches!(event, ConnectionEvent::ReconnectionFailed { attempts: 5, .. }));
    assert_eq!(net.opens(A), 6);
    assert_eq!(manager.network_status("mainnet").unwrap().reconnect_attempts, 5);

    manager.stop_health_monitoring();

    let outcome = manager.force_reconnect("mainnet").await.unwrap();
    assert_eq!(outcome, ReconnectOutcome::Failed);
    assert_eq!(net.opens(A), 7);
    assert_eq!(manager.network_status("mainnet").unwrap().reconnect_attempts, 1);

    net.set(A, up(1));
    let outcome = manager.force_reconnect("mainnet").await.unwrap();
    assert_eq!(outcome, ReconnectOutcome::Reconnected);
    assert!(manager.get_provider("mainnet").is_ok());
    assert_eq!(manager.network_status("mainnet").unwrap().reconnect_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_polygon_failover_failure_then_reconnect_attempt() {
    let net = MockNet::new();
    net.set(P, up(137));
    net.set(Q, up(137));
    let manager = manager(&net);
    let mut events = manager.subscribe();
    manager
        .initialize_connection(NetworkConfig::new("polygon", 137, P).with_backups([Q]))
        .await
        .unwrap();

    net.set(P, Behavior::Down);
    net.set(Q, Behavior::Down);
    net.fault(P);

    let event = wait_for(&mut events, |e| {
        matches!(e, ConnectionEvent::FailoverSuccess { .. } | ConnectionEvent::FailoverFailed { .. })
    })
    .await;
    assert_eq!(
        event,
        ConnectionEvent::FailoverFailed {
            network: "polygon".into()
        }
    );
    assert!(!manager.is_network_healthy("polygon"));
    assert_eq!(manager.network_status("polygon").unwrap().reconnect_attempts, 0);

    manager.start_health_monitoring();
    time::sleep(Duration::from_secs(1)).await;

    assert_eq!(manager.network_status("polygon").unwrap().reconnect_attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_rebuilds_from_config() {
    let net = MockNet::new();
    net.set(A, up(1));
    net.set(B, up(1));
    let manager = manager(&net);
    let mut events = manager.subscribe();
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A).with_backups([B]))
        .await
        .unwrap();

    net.set(A, Behavior::Down);
    manager.start_health_monitoring();

    let event = wait_for(&mut events, |e| matches!(e, ConnectionEvent::ReconnectionSuccess { .. })).await;
    assert_eq!(
        event,
        ConnectionEvent::ReconnectionSuccess {
            network: "mainnet".into(),
            attempts: 1,
        }
    );

    let status = manager.network_status("mainnet").unwrap();
    assert!(status.healthy);
    assert_eq!(status.active_index, 1);
    assert_eq!(status.reconnect_attempts, 0);
    assert_eq!(net.opens(A), 2);
    assert_eq!(net.opens(B), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_monitoring_cancels_pending_reconnect() {
    let net = MockNet::new();
    net.set(A, up(1));
    let manager = manager(&net);
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();

    net.set(A, Behavior::Down);
    manager.start_health_monitoring();
    manager.start_health_monitoring();
    time::sleep(Duration::from_secs(1)).await;

    // First tick failed and a reconnection is waiting out its delay.
    assert!(!manager.is_network_healthy("mainnet"));
    assert_eq!(manager.network_status("mainnet").unwrap().reconnect_attempts, 1);

    manager.stop_health_monitoring();
    assert!(!manager.is_monitoring());
    let opens = net.total_opens();
    let calls = net.total_calls();

    time::sleep(Duration::from_secs(120)).await;
    assert_eq!(net.total_opens(), opens);
    assert_eq!(net.total_calls(), calls);

    manager.stop_health_monitoring();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_forced_reconnect() {
    let net = MockNet::new();
    net.set(A, up(1));
    let manager = manager(&net);
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    net.set(A, Behavior::Down);
    let forced = tokio::spawn({
        let manager = manager.clone();
        async move { manager.force_reconnect("mainnet").await }
    });
    time::sleep(Duration::from_secs(1)).await;

    manager.shutdown();
    net.set(A, up(1));
    time::sleep(Duration::from_secs(30)).await;

    assert_eq!(forced.await.unwrap().unwrap(), ReconnectOutcome::Failed);
    assert_eq!(net.opens(A), 1);
    assert!(events.try_recv().is_err());
    assert!(manager.network_status("mainnet").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stop_monitoring_cancels_forced_reconnect() {
    let net = MockNet::new();
    net.set(A, up(1));
    let manager = manager(&net);
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();

    net.set(A, Behavior::Down);
    let forced = tokio::spawn({
        let manager = manager.clone();
        async move { manager.force_reconnect("mainnet").await }
    });
    time::sleep(Duration::from_secs(1)).await;

    manager.stop_health_monitoring();
    net.set(A, up(1));
    time::sleep(Duration::from_secs(30)).await;

    assert_eq!(forced.await.unwrap().unwrap(), ReconnectOutcome::Failed);
    assert_eq!(net.opens(A), 1);
    // Still tracked and reconnectable on demand.
    assert_eq!(
        manager.force_reconnect("mainnet").await.unwrap(),
        ReconnectOutcome::Reconnected
    );
    assert_eq!(net.opens(A), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_monitoring_without_failures() {
    let net = MockNet::new();
    net.set(A, up(1));
    let manager = manager(&net);
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();

    manager.start_health_monitoring();
    time::sleep(Duration::from_secs(61)).await;
    let calls = net.calls(A);
    assert!(calls > 0);

    manager.stop_health_monitoring();
    time::sleep(Duration::from_secs(300)).await;
    assert_eq!(net.calls(A), calls);
    assert_eq!(net.opens(A), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_chain_marks_unhealthy_until_check_passes() {
    let net = MockNet::new();
    net.set(A, up(1));
    let manager = manager(&net);
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();

    manager.start_health_monitoring();
    time::sleep(Duration::from_secs(1)).await;
    net.set(A, up(5));

    time::sleep(Duration::from_secs(31)).await;
    assert!(matches!(
        manager.get_provider("mainnet"),
        Err(ConnectionError::NetworkUnhealthy(_))
    ));
    let status = manager.network_status("mainnet").unwrap();
    assert!(status.health.error.unwrap().contains("chain id"));

    // The scheduled reconnection still sees the wrong chain and fails.
    time::sleep(Duration::from_secs(5)).await;
    assert!(!manager.is_network_healthy("mainnet"));

    net.set(A, up(1));
    time::sleep(Duration::from_secs(30)).await;

    let status = manager.network_status("mainnet").unwrap();
    assert!(status.healthy);
    assert_eq!(status.health.block_number, Some(19_000_000));
    // A passing check does not refund the retry budget.
    assert_eq!(status.reconnect_attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failover_proceeds_during_other_networks_retry_delay() {
    let net = MockNet::new();
    net.set(A, up(1));
    net.set(P, up(137));
    net.set(Q, up(137));
    let manager = manager(&net);
    let mut events = manager.subscribe();
    manager
        .initialize_connection(NetworkConfig::new("mainnet", 1, A))
        .await
        .unwrap();
    manager
        .initialize_connection(NetworkConfig::new("polygon", 137, P).with_backups([Q]))
        .await
        .unwrap();

    net.set(A, Behavior::Down);
    manager.start_health_monitoring();
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(manager.network_status("mainnet").unwrap().reconnect_attempts, 1);

    let started = Instant::now();
    net.set(P, Behavior::Down);
    net.fault(P);
    wait_for(&mut events, |e| matches!(e, ConnectionEvent::FailoverSuccess { .. })).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(manager.is_network_healthy("polygon"));
    assert!(!manager.is_network_healthy("mainnet"));
}
