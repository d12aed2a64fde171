// Metrics and monitoring

use prometheus::{Counter, Registry};
use std::sync::Arc;

/// Relay engine metrics
pub struct RelayerMetrics {
    // Log-to-datagram conversion
    pub events_relayed: Counter,

    // Admission state machine
    pub heights_installed: Counter,
    pub datagrams_held: Counter,
    pub datagrams_submitted: Counter,

    registry: Arc<Registry>,
}

impl RelayerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_relayed = Counter::new(
            "relay_events_relayed_total",
            "Log entries converted into pending datagrams",
        )?;
        let heights_installed = Counter::new(
            "relay_heights_installed_total",
            "Client heights installed on destination chains",
        )?;
        let datagrams_held = Counter::new(
            "relay_datagrams_held_total",
            "Queue-head examinations that found the delay not yet elapsed",
        )?;
        let datagrams_submitted = Counter::new(
            "relay_datagrams_submitted_total",
            "Datagrams delivered to destination chains",
        )?;

        registry.register(Box::new(events_relayed.clone()))?;
        registry.register(Box::new(heights_installed.clone()))?;
        registry.register(Box::new(datagrams_held.clone()))?;
        registry.register(Box::new(datagrams_submitted.clone()))?;

        Ok(Self {
            events_relayed,
            heights_installed,
            datagrams_held,
            datagrams_submitted,
            registry,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_and_count() {
        let metrics = RelayerMetrics::new().unwrap();

        metrics.events_relayed.inc();
        metrics.heights_installed.inc();
        metrics.datagrams_held.inc();
        metrics.datagrams_submitted.inc();

        let families = metrics.registry().gather();
        assert_eq!(families.len(), 4);
    }
}
