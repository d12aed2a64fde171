// Error types for the in-process relay contracts

use thiserror::Error;

use crate::chains::ChainId;

/// Errors at the edges of the relay core. The admission decisions
/// themselves are total; only the contract with the embedding (unknown
/// chain identities, configuration I/O) can fail.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unknown chain: {0}")]
    UnknownChain(ChainId),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[cfg(feature = "metrics")]
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
