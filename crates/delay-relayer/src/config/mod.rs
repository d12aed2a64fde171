use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chains::ChainId;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayerConfig {
    /// Minimum number of time units that must strictly elapse between a
    /// client height install and the submission of any datagram whose
    /// proof relies on that height.
    pub max_delay: u64,
    /// Participant chain identities. The reference wiring is one pair.
    pub chains: Vec<ChainId>,
    /// Channel ordering mode. Consumed by the chain components'
    /// acceptance logic, carried here for the pairing's configuration.
    pub ordering: ChannelOrdering,
    /// Bounds used by simulation-style tests, never enforced at runtime.
    pub bounds: ModelBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrdering {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBounds {
    /// Largest chain height explored by bounded simulations.
    pub max_height: u64,
    /// Largest packet sequence number explored by bounded simulations.
    pub max_sequence: u64,
}

impl RelayerConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The paired counterparty of `chain_id`, when the configuration
    /// describes exactly one pair.
    pub fn counterparty_of(&self, chain_id: &ChainId) -> Option<&ChainId> {
        match self.chains.as_slice() {
            [a, b] if a == chain_id => Some(b),
            [a, b] if b == chain_id => Some(a),
            _ => None,
        }
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            max_delay: 5,
            chains: vec![ChainId::new("chain-a"), ChainId::new("chain-b")],
            ordering: ChannelOrdering::Unordered,
            bounds: ModelBounds {
                max_height: 10,
                max_sequence: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayerConfig::default();
        assert_eq!(config.max_delay, 5);
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.ordering, ChannelOrdering::Unordered);
    }

    #[test]
    fn test_counterparty_lookup() {
        let config = RelayerConfig::default();
        let a = ChainId::new("chain-a");
        let b = ChainId::new("chain-b");

        assert_eq!(config.counterparty_of(&a), Some(&b));
        assert_eq!(config.counterparty_of(&b), Some(&a));
        assert_eq!(config.counterparty_of(&ChainId::new("chain-c")), None);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayer.toml");

        let mut config = RelayerConfig::default();
        config.max_delay = 9;
        config.ordering = ChannelOrdering::Ordered;
        config.save(&path).unwrap();

        let loaded = RelayerConfig::load(&path).unwrap();
        assert_eq!(loaded.max_delay, 9);
        assert_eq!(loaded.ordering, ChannelOrdering::Ordered);
        assert_eq!(loaded.chains, config.chains);
    }
}
