// Delay-gated relay core
// This module structure exposes the relayer components for testing and embedding

pub mod chains;
pub mod config;
pub mod error;
pub mod events;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod relay;

// Re-export commonly used types for convenience
pub use chains::{Chain, ChainEndpoint, ChainId, InMemoryChain};
pub use config::{ChannelOrdering, ModelBounds, RelayerConfig};
pub use error::RelayError;
pub use events::{PacketEventKind, PacketLog, PacketLogEntry};
#[cfg(feature = "metrics")]
pub use metrics::RelayerMetrics;
pub use relay::{
    Action, Datagram, DelayAudit, GateDecision, GateOutcome, PacketData, RelayEngine,
};
