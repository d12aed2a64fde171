// Datagram construction from packet log entries

use tracing::debug;

use super::{Datagram, PacketData};
use crate::chains::ChainEndpoint;
use crate::events::{PacketEventKind, PacketLogEntry};

/// Build the datagram a log entry calls for, if any.
///
/// `src` is the endpoint of the chain that produced the entry, `dst` its
/// counterparty, and `proof_height` the source chain's height read at
/// call time. Pure: no queue or chain state is touched here.
///
/// A `SendPacket` entry yields a `PacketRecv` addressed src -> dst. A
/// `WriteAcknowledgement` entry yields a `PacketAck` whose packet
/// carries the original send direction, dst -> src, since the
/// acknowledging chain was the receiver of that packet. Unrecognized
/// kinds yield `None`; the caller consumes the entry either way.
pub fn make_datagram(
    src: &ChainEndpoint,
    dst: &ChainEndpoint,
    entry: &PacketLogEntry,
    proof_height: u64,
) -> Option<Datagram> {
    match entry.kind {
        PacketEventKind::SendPacket => Some(Datagram::PacketRecv {
            packet: PacketData {
                sequence: entry.sequence,
                source_port: src.port_id.clone(),
                source_channel: src.channel_id.clone(),
                destination_port: dst.port_id.clone(),
                destination_channel: dst.channel_id.clone(),
                timeout_height: entry.timeout_height,
            },
            proof_height,
        }),
        PacketEventKind::WriteAcknowledgement => Some(Datagram::PacketAck {
            packet: PacketData {
                sequence: entry.sequence,
                source_port: dst.port_id.clone(),
                source_channel: dst.channel_id.clone(),
                destination_port: src.port_id.clone(),
                destination_channel: src.channel_id.clone(),
                timeout_height: entry.timeout_height,
            },
            acknowledgement: entry.acknowledgement.clone().unwrap_or_default(),
            proof_height,
        }),
        _ => {
            debug!(
                "ignoring {:?} log entry seq={} from {}: no datagram mapping",
                entry.kind, entry.sequence, entry.source_chain
            );
            None
        }
    }
}
