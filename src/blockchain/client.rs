//! Alloy-backed RPC transports.
//!
//! # Responsibilities
//! - Open JSON-RPC providers for endpoint URLs (HTTP, WebSocket, IPC)
//! - Answer chain id and block number queries for probing
//! - Carry the fault channel callers use to report runtime RPC failures

use std::sync::Arc;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use futures_util::future::BoxFuture;
use tokio::sync::broadcast;
use url::Url;

use crate::blockchain::transport::{Connector, RpcTransport};
use crate::blockchain::types::TransportFault;

/// Capacity of a transport's fault channel. Only the first fault matters to
/// the manager, the rest may be dropped.
const FAULT_CHANNEL_CAPACITY: usize = 8;

/// Opens alloy providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlloyConnector;

impl Connector for AlloyConnector {
    type Transport = AlloyTransport;

    fn open<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Arc<AlloyTransport>, TransportFault>> {
        Box::pin(async move {
            let provider = match url.scheme() {
                "http" | "https" => ProviderBuilder::new().connect_http(url.clone()).erased(),
                _ => ProviderBuilder::new()
                    .connect(url.as_str())
                    .await
                    .map_err(TransportFault::new)?
                    .erased(),
            };
            Ok(Arc::new(AlloyTransport::new(url.clone(), provider)))
        })
    }
}

/// A live alloy provider bound to one endpoint.
///
/// This is the handle callers receive from
/// [`ConnectionManager::get_provider`](crate::connection::ConnectionManager::get_provider).
pub struct AlloyTransport {
    url: Url,
    provider: DynProvider,
    faults: broadcast::Sender<TransportFault>,
}

impl AlloyTransport {
    pub fn new(url: Url, provider: DynProvider) -> Self {
        let (faults, _) = broadcast::channel(FAULT_CHANNEL_CAPACITY);
        Self { url, provider, faults }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Endpoint URL this transport is bound to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Report a runtime failure seen while using this provider.
    ///
    /// The connection manager listens on this channel and fails over to the
    /// next endpoint of the network.
    pub fn report_fault(&self, reason: impl std::fmt::Display) {
        let fault = TransportFault::new(reason);
        tracing::debug!(url = %self.url, error = %fault, "Transport fault reported");
        // No receivers means the handle is no longer active; nothing to do.
        let _ = self.faults.send(fault);
    }
}

impl RpcTransport for AlloyTransport {
    fn chain_id(&self) -> BoxFuture<'_, Result<u64, TransportFault>> {
        Box::pin(async move { self.provider.get_chain_id().await.map_err(TransportFault::new) })
    }

    fn block_number(&self) -> BoxFuture<'_, Result<u64, TransportFault>> {
        Box::pin(async move { self.provider.get_block_number().await.map_err(TransportFault::new) })
    }

    fn faults(&self) -> broadcast::Receiver<TransportFault> {
        self.faults.subscribe()
    }
}

impl std::fmt::Debug for AlloyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyTransport")
            .field("url", &self.url.as_str())
            .finish()
    }
}
