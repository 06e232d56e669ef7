//! Transport seam between the connection manager and concrete RPC clients.
//!
//! The manager only needs three capabilities from an endpoint: its chain id,
//! its latest block number, and a channel on which runtime failures are
//! announced. Everything else a caller does with the handle is opaque here.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::broadcast;
use url::Url;

use crate::blockchain::types::TransportFault;

/// An open connection to one RPC endpoint.
pub trait RpcTransport: Send + Sync + 'static {
    /// Chain id reported by the endpoint (`eth_chainId`).
    fn chain_id(&self) -> BoxFuture<'_, Result<u64, TransportFault>>;

    /// Latest block number reported by the endpoint (`eth_blockNumber`).
    fn block_number(&self) -> BoxFuture<'_, Result<u64, TransportFault>>;

    /// Subscribe to runtime failures observed on this transport.
    fn faults(&self) -> broadcast::Receiver<TransportFault>;
}

/// Opens transports for endpoint URLs.
pub trait Connector: Send + Sync + 'static {
    type Transport: RpcTransport;

    fn open<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Arc<Self::Transport>, TransportFault>>;
}
