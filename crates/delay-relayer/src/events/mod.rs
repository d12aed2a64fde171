// Packet lifecycle events and the shared log they are drained from

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::chains::ChainId;

/// Lifecycle event kinds chains write to the packet log.
///
/// The datagram factory recognizes `SendPacket` and
/// `WriteAcknowledgement`; every other kind is consumed from the log
/// without producing a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketEventKind {
    SendPacket,
    WriteAcknowledgement,
    TimeoutPacket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketLogEntry {
    pub kind: PacketEventKind,
    /// Assigned by the source chain in increasing order per channel.
    pub sequence: u64,
    /// Destination-chain height after which the packet is invalid.
    pub timeout_height: u64,
    /// Chain that produced this entry.
    pub source_chain: ChainId,
    /// Present only for `WriteAcknowledgement`.
    pub acknowledgement: Option<Vec<u8>>,
}

/// Append-only FIFO of lifecycle events, shared by all chains and
/// consumed strictly in the order produced, one entry per drain.
#[derive(Debug, Default)]
pub struct PacketLog {
    entries: Mutex<VecDeque<PacketLogEntry>>,
}

impl PacketLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: PacketLogEntry) {
        self.entries
            .lock()
            .expect("packet log lock poisoned")
            .push_back(entry);
    }

    pub fn pop_front(&self) -> Option<PacketLogEntry> {
        self.entries
            .lock()
            .expect("packet log lock poisoned")
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("packet log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sequence: u64) -> PacketLogEntry {
        PacketLogEntry {
            kind: PacketEventKind::SendPacket,
            sequence,
            timeout_height: 10,
            source_chain: ChainId::new("chain-a"),
            acknowledgement: None,
        }
    }

    #[test]
    fn test_log_is_fifo() {
        let log = PacketLog::new();
        log.append(entry(1));
        log.append(entry(2));
        log.append(entry(3));

        assert_eq!(log.len(), 3);
        assert_eq!(log.pop_front().unwrap().sequence, 1);
        assert_eq!(log.pop_front().unwrap().sequence, 2);
        assert_eq!(log.pop_front().unwrap().sequence, 3);
        assert!(log.pop_front().is_none());
        assert!(log.is_empty());
    }
}
