//! Shared utilities for integration tests.
//!
//! `MockNet` is a scripted set of RPC endpoints. Each URL has a behavior
//! that can be flipped at any time; opens and RPC calls are counted per URL.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use url::Url;

use rpc_manager::blockchain::{Connector, RpcTransport, TransportFault};
use rpc_manager::config::ConnectionConfig;
use rpc_manager::endpoint::PublicFallbacks;
use rpc_manager::events::ConnectionEvent;
use rpc_manager::ConnectionManager;

/// How an endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Up { chain_id: u64, block: u64 },
    /// Refuses connections and fails every call.
    Down,
    /// Never answers.
    Hang,
}

pub fn up(chain_id: u64) -> Behavior {
    Behavior::Up {
        chain_id,
        block: 19_000_000,
    }
}

pub fn key(url: &str) -> String {
    Url::parse(url).expect("test URL").to_string()
}

#[derive(Default)]
struct Registry {
    behaviors: HashMap<String, Behavior>,
    opens: HashMap<String, usize>,
    calls: HashMap<String, usize>,
    open_log: Vec<String>,
    transports: HashMap<String, Vec<Arc<MockTransport>>>,
}

#[derive(Clone, Default)]
pub struct MockNet {
    registry: Arc<Mutex<Registry>>,
}

impl MockNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, url: &str, behavior: Behavior) {
        self.registry.lock().behaviors.insert(key(url), behavior);
    }

    pub fn behavior(&self, url: &str) -> Behavior {
        self.registry
            .lock()
            .behaviors
            .get(&key(url))
            .copied()
            .unwrap_or(Behavior::Down)
    }

    pub fn opens(&self, url: &str) -> usize {
        self.registry.lock().opens.get(&key(url)).copied().unwrap_or(0)
    }

    pub fn total_opens(&self) -> usize {
        self.registry.lock().opens.values().sum()
    }

    pub fn calls(&self, url: &str) -> usize {
        self.registry.lock().calls.get(&key(url)).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.registry.lock().calls.values().sum()
    }

    /// URLs in the order they were opened.
    pub fn open_log(&self) -> Vec<String> {
        self.registry.lock().open_log.clone()
    }

    /// Announce a runtime failure on the latest transport opened for `url`.
    pub fn fault(&self, url: &str) {
        let transport = self
            .registry
            .lock()
            .transports
            .get(&key(url))
            .and_then(|all| all.last().cloned())
            .expect("transport was opened");
        let _ = transport.faults.send(TransportFault::new("connection reset by peer"));
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector { net: self.clone() }
    }

    fn record_call(&self, url: &str) -> Behavior {
        let mut registry = self.registry.lock();
        *registry.calls.entry(url.to_string()).or_default() += 1;
        registry.behaviors.get(url).copied().unwrap_or(Behavior::Down)
    }
}

pub struct MockTransport {
    url: String,
    net: MockNet,
    faults: broadcast::Sender<TransportFault>,
}

impl MockTransport {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for MockTransport {
    fn chain_id(&self) -> BoxFuture<'_, Result<u64, TransportFault>> {
        Box::pin(async move {
            match self.net.record_call(&self.url) {
                Behavior::Up { chain_id, .. } => Ok(chain_id),
                Behavior::Down => Err(TransportFault::new("connection refused")),
                Behavior::Hang => std::future::pending().await,
            }
        })
    }

    fn block_number(&self) -> BoxFuture<'_, Result<u64, TransportFault>> {
        Box::pin(async move {
            match self.net.record_call(&self.url) {
                Behavior::Up { block, .. } => Ok(block),
                Behavior::Down => Err(TransportFault::new("connection refused")),
                Behavior::Hang => std::future::pending().await,
            }
        })
    }

    fn faults(&self) -> broadcast::Receiver<TransportFault> {
        self.faults.subscribe()
    }
}

#[derive(Clone)]
pub struct MockConnector {
    net: MockNet,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn open<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Arc<MockTransport>, TransportFault>> {
        Box::pin(async move {
            let url = url.to_string();
            let behavior = {
                let mut registry = self.net.registry.lock();
                *registry.opens.entry(url.clone()).or_default() += 1;
                registry.open_log.push(url.clone());
                registry.behaviors.get(&url).copied().unwrap_or(Behavior::Down)
            };

            match behavior {
                Behavior::Down => Err(TransportFault::new("connection refused")),
                Behavior::Hang => std::future::pending().await,
                Behavior::Up { .. } => {
                    let (faults, _) = broadcast::channel(4);
                    let transport = Arc::new(MockTransport {
                        url: url.clone(),
                        net: self.net.clone(),
                        faults,
                    });
                    self.net
                        .registry
                        .lock()
                        .transports
                        .entry(url)
                        .or_default()
                        .push(transport.clone());
                    Ok(transport)
                }
            }
        })
    }
}

pub fn settings() -> ConnectionConfig {
    ConnectionConfig::default()
}

pub fn manager(net: &MockNet) -> ConnectionManager<MockConnector> {
    ConnectionManager::new(net.connector(), settings(), PublicFallbacks::empty())
}

pub fn manager_with_fallbacks(net: &MockNet, fallbacks: PublicFallbacks) -> ConnectionManager<MockConnector> {
    ConnectionManager::new(net.connector(), settings(), fallbacks)
}

/// Wait for the first event matching `predicate`, skipping the rest.
pub async fn wait_for<F>(events: &mut broadcast::Receiver<ConnectionEvent>, predicate: F) -> ConnectionEvent
where
    F: Fn(&ConnectionEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3600), async {
        loop {
            let event = events.recv().await.expect("event bus open");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event arrived in time")
}
