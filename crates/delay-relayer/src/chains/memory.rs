// In-memory chain component backed by a logical clock, used by tests
// and simulations in place of a real chain backend

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Chain, ChainId};
use crate::error::Result;
use crate::events::{PacketEventKind, PacketLog, PacketLogEntry};
use crate::relay::Datagram;

#[derive(Debug, Default)]
struct ChainState {
    height: u64,
    timestamp: u64,
    /// Counterparty height -> install timestamp. Append-only.
    client_heights: BTreeMap<u64, u64>,
    /// Datagrams accepted for processing, in submission order.
    incoming: VecDeque<Datagram>,
}

/// A chain whose externally visible state lives behind a mutex: height,
/// logical clock, counterparty client height table and incoming
/// datagram queue.
///
/// The relay core only uses the [`Chain`] surface. The inherent methods
/// are the chain-internal steps an environment drives: height advances
/// and packet log production.
pub struct InMemoryChain {
    chain_id: ChainId,
    state: Mutex<ChainState>,
    log: Arc<PacketLog>,
}

impl InMemoryChain {
    pub fn new(chain_id: ChainId, log: Arc<PacketLog>) -> Self {
        Self::with_height(chain_id, log, 0)
    }

    pub fn with_height(chain_id: ChainId, log: Arc<PacketLog>, height: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::new(ChainState {
                height,
                ..ChainState::default()
            }),
            log,
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().expect("chain state lock poisoned")
    }

    /// One chain-internal step: height and logical clock both advance.
    pub fn advance(&self) {
        let mut state = self.state();
        state.height += 1;
        state.timestamp += 1;
    }

    /// Record a sent packet in the shared log.
    pub fn send_packet(&self, sequence: u64, timeout_height: u64) {
        self.log.append(PacketLogEntry {
            kind: PacketEventKind::SendPacket,
            sequence,
            timeout_height,
            source_chain: self.chain_id.clone(),
            acknowledgement: None,
        });
    }

    /// Record a written acknowledgement in the shared log.
    pub fn write_acknowledgement(&self, sequence: u64, timeout_height: u64, ack: Vec<u8>) {
        self.log.append(PacketLogEntry {
            kind: PacketEventKind::WriteAcknowledgement,
            sequence,
            timeout_height,
            source_chain: self.chain_id.clone(),
            acknowledgement: Some(ack),
        });
    }

    /// Datagrams accepted so far, in delivery order.
    pub fn delivered(&self) -> Vec<Datagram> {
        self.state().incoming.iter().cloned().collect()
    }

    /// Snapshot of the counterparty client height table.
    pub fn client_heights(&self) -> BTreeMap<u64, u64> {
        self.state().client_heights.clone()
    }

    pub fn height(&self) -> u64 {
        self.state().height
    }

    pub fn timestamp(&self) -> u64 {
        self.state().timestamp
    }
}

#[async_trait]
impl Chain for InMemoryChain {
    fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    async fn latest_height(&self) -> Result<u64> {
        Ok(self.state().height)
    }

    async fn local_timestamp(&self) -> Result<u64> {
        Ok(self.state().timestamp)
    }

    async fn client_height_timestamp(&self, height: u64) -> Result<Option<u64>> {
        Ok(self.state().client_heights.get(&height).copied())
    }

    async fn install_client_height(&self, height: u64) -> Result<u64> {
        let mut state = self.state();
        if let Some(&at) = state.client_heights.get(&height) {
            // Install-once: never overwrite an existing stamp.
            return Ok(at);
        }
        let at = state.timestamp;
        state.client_heights.insert(height, at);
        state.timestamp += 1;
        Ok(at)
    }

    async fn deliver(&self, datagram: Datagram) -> Result<()> {
        self.state().incoming.push_back(datagram);
        Ok(())
    }
}
