// Chain-facing contracts: identities, endpoints and the view the relay
// core reads (and, for client heights, writes)

pub mod memory;

pub use memory::InMemoryChain;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::relay::Datagram;

/// Identifier of a participant chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Port and channel identifiers a chain uses on its side of a pairing.
/// Derived deterministically from the identity pair, never stored
/// per-instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub chain_id: ChainId,
    pub port_id: String,
    pub channel_id: String,
}

impl ChainEndpoint {
    /// Endpoints for a pairing, returned in argument order. The
    /// lexicographically smaller identity gets `channel-0`, the other
    /// `channel-1`, so both sides derive the same assignment.
    pub fn for_pair(a: &ChainId, b: &ChainId) -> (ChainEndpoint, ChainEndpoint) {
        let endpoint = |id: &ChainId, n: u32| ChainEndpoint {
            chain_id: id.clone(),
            port_id: "transfer".to_string(),
            channel_id: format!("channel-{}", n),
        };
        if a <= b {
            (endpoint(a, 0), endpoint(b, 1))
        } else {
            (endpoint(a, 1), endpoint(b, 0))
        }
    }
}

/// Read/query surface of a chain, plus the two write paths the relay
/// core owns: client height installs and datagram delivery.
///
/// Everything else about a chain (handshakes, commitment storage,
/// acknowledgement writing, its own height/clock advances) belongs to
/// the chain component behind this trait.
#[async_trait]
pub trait Chain: Send + Sync {
    fn chain_id(&self) -> &ChainId;

    /// Current chain height. Non-decreasing.
    async fn latest_height(&self) -> Result<u64>;

    /// Current chain-local logical clock. Non-decreasing.
    async fn local_timestamp(&self) -> Result<u64>;

    /// Timestamp at which `height` was installed as a counterparty
    /// client height, or `None` when it has not been installed.
    async fn client_height_timestamp(&self, height: u64) -> Result<Option<u64>>;

    /// Install `height` stamped with the current local timestamp, then
    /// advance the local clock by one. Installing an already-installed
    /// height leaves the existing stamp untouched and returns it.
    async fn install_client_height(&self, height: u64) -> Result<u64>;

    /// Hand a datagram over to the chain's incoming queue.
    async fn deliver(&self, datagram: Datagram) -> Result<()>;
}
