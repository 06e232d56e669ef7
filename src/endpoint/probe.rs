//! Bounded endpoint probing.
//!
//! # Responsibilities
//! - Open a transport for a candidate and verify it serves the expected chain
//! - Re-validate an already open transport (health checks)
//! - Always resolve: success, typed failure, or timeout
//!
//! # Design Decisions
//! - Opening the transport counts against the probe deadline
//! - Chain id and block number are fetched concurrently
//! - A block number of 0 means the node is not usable (unsynced or broken)

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use url::Url;

use crate::blockchain::transport::{Connector, RpcTransport};
use crate::blockchain::types::{ChainId, TransportFault};
use crate::connection::errors::ProbeError;
use crate::endpoint::candidate::EndpointCandidate;

/// What a successful probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub chain_id: ChainId,
    pub block_number: u64,
}

/// A transport that passed its probe.
pub struct ProbedEndpoint<T> {
    pub transport: Arc<T>,
    pub report: ProbeReport,
}

/// Open `candidate` and verify it within `timeout`.
pub async fn probe<C: Connector>(
    connector: &C,
    candidate: &EndpointCandidate,
    expected: ChainId,
    timeout: Duration,
) -> Result<ProbedEndpoint<C::Transport>, ProbeError> {
    let url = &candidate.url;
    let attempt = async {
        let transport = connector
            .open(url)
            .await
            .map_err(|fault| transport_error(url, fault))?;
        let identity = fetch_identity(transport.as_ref(), url).await?;
        Ok::<_, ProbeError>((transport, identity))
    };

    let (transport, (chain_id, block_number)) = match time::timeout(timeout, attempt).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ProbeError::Timeout {
                url: url.clone(),
                timeout,
            })
        }
    };

    let report = check_identity(url, expected, chain_id, block_number)?;
    Ok(ProbedEndpoint { transport, report })
}

/// Verify an already open transport within `timeout`.
pub async fn validate<T: RpcTransport + ?Sized>(
    transport: &T,
    url: &Url,
    expected: ChainId,
    timeout: Duration,
) -> Result<ProbeReport, ProbeError> {
    let (chain_id, block_number) = time::timeout(timeout, fetch_identity(transport, url))
        .await
        .map_err(|_| ProbeError::Timeout {
            url: url.clone(),
            timeout,
        })??;
    check_identity(url, expected, chain_id, block_number)
}

async fn fetch_identity<T: RpcTransport + ?Sized>(
    transport: &T,
    url: &Url,
) -> Result<(u64, u64), ProbeError> {
    tokio::try_join!(transport.chain_id(), transport.block_number())
        .map_err(|fault| transport_error(url, fault))
}

fn check_identity(
    url: &Url,
    expected: ChainId,
    chain_id: u64,
    block_number: u64,
) -> Result<ProbeReport, ProbeError> {
    if chain_id != expected.0 {
        return Err(ProbeError::ChainIdMismatch {
            url: url.clone(),
            expected,
            actual: ChainId(chain_id),
        });
    }
    if block_number == 0 {
        return Err(ProbeError::InvalidBlockNumber { url: url.clone() });
    }
    Ok(ProbeReport {
        chain_id: expected,
        block_number,
    })
}

fn transport_error(url: &Url, fault: TransportFault) -> ProbeError {
    ProbeError::Transport {
        url: url.clone(),
        reason: fault.0,
    }
}
