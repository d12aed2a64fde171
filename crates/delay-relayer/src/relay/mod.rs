// Core relay engine: datagram construction, delay gating and submission

pub mod audit;
pub mod engine;
pub mod factory;
pub mod gate;

pub use audit::DelayAudit;
pub use engine::{Action, GateOutcome, RelayEngine};
pub use factory::make_datagram;
pub use gate::GateDecision;

use serde::{Deserialize, Serialize};

/// Addressing and identification of a relayed packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketData {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    pub timeout_height: u64,
}

/// Proof-carrying message bound for a counterparty chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datagram {
    PacketRecv {
        packet: PacketData,
        proof_height: u64,
    },
    PacketAck {
        packet: PacketData,
        acknowledgement: Vec<u8>,
        proof_height: u64,
    },
}

impl Datagram {
    /// Source-chain height whose installation on the destination chain
    /// gates submission of this datagram.
    pub fn proof_height(&self) -> u64 {
        match self {
            Datagram::PacketRecv { proof_height, .. } => *proof_height,
            Datagram::PacketAck { proof_height, .. } => *proof_height,
        }
    }

    pub fn packet(&self) -> &PacketData {
        match self {
            Datagram::PacketRecv { packet, .. } => packet,
            Datagram::PacketAck { packet, .. } => packet,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.packet().sequence
    }
}
