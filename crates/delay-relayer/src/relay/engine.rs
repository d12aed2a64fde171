// Delay-gated relay engine: drains the packet log into per-chain
// pending queues and admits queue heads once their proof height has
// been installed on the destination long enough

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info};

use super::audit::DelayAudit;
use super::factory::make_datagram;
use super::gate::{self, GateDecision};
use super::Datagram;
use crate::chains::{Chain, ChainEndpoint, ChainId};
use crate::config::RelayerConfig;
use crate::error::{RelayError, Result};
use crate::events::PacketLog;
#[cfg(feature = "metrics")]
use crate::metrics::RelayerMetrics;

/// One schedulable relay action. The engine fires exactly one per step,
/// chosen among the currently enabled ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Convert the packet log head into a pending datagram.
    RelayEvent,
    /// Examine the head of this chain's pending queue.
    ProcessHead(ChainId),
    /// Ambient client update: install the counterparty's current height.
    UpdateClient(ChainId),
}

/// Outcome of [`RelayEngine::process_head`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Pending queue was empty.
    Idle,
    /// Proof height was missing and has been installed; the datagram
    /// stays at the head of the queue.
    Installed { height: u64, at: u64 },
    /// Height installed but the delay has not strictly elapsed. No
    /// state change; the head is re-examined on a later step.
    Held { height: u64, ready_at: u64 },
    /// Head dequeued and delivered to the destination chain.
    Submitted { height: u64, at: u64 },
}

/// Relay engine coordinating datagram flow between a pair of chains.
///
/// All state transitions go through three operations, each atomic with
/// respect to the others: [`relay_next_event`](Self::relay_next_event),
/// [`process_head`](Self::process_head) and
/// [`update_client`](Self::update_client). The scheduler in
/// [`step`](Self::step) picks one enabled operation at random so that
/// no continuously enabled one starves.
pub struct RelayEngine {
    /// Chain implementations mapped by chain ID
    chains: HashMap<ChainId, Arc<dyn Chain>>,
    /// Pair-derived addressing per chain
    endpoints: HashMap<ChainId, ChainEndpoint>,
    /// The other chain of the pairing, per chain
    counterparties: HashMap<ChainId, ChainId>,
    /// Shared packet log produced by the chain components
    log: Arc<PacketLog>,
    /// Datagrams awaiting delay-gated submission, per destination chain
    pending: HashMap<ChainId, VecDeque<Datagram>>,
    /// Optional submission history for invariant checking
    audit: Option<DelayAudit>,
    /// Minimum time units between height install and submission
    max_delay: u64,
    /// Metrics collection
    #[cfg(feature = "metrics")]
    metrics: Arc<RelayerMetrics>,
    /// Shutdown signal
    shutdown: watch::Receiver<bool>,
}

impl RelayEngine {
    /// Wire an engine over one chain pair. Returns the engine and the
    /// shutdown handle for its [`run`](Self::run) loop.
    pub fn new(
        config: &RelayerConfig,
        chain_a: Arc<dyn Chain>,
        chain_b: Arc<dyn Chain>,
        log: Arc<PacketLog>,
    ) -> Result<(Self, watch::Sender<bool>)> {
        let (shutdown_sender, shutdown) = watch::channel(false);

        let id_a = chain_a.chain_id().clone();
        let id_b = chain_b.chain_id().clone();
        let (endpoint_a, endpoint_b) = ChainEndpoint::for_pair(&id_a, &id_b);

        let mut chains: HashMap<ChainId, Arc<dyn Chain>> = HashMap::new();
        chains.insert(id_a.clone(), chain_a);
        chains.insert(id_b.clone(), chain_b);

        let mut endpoints = HashMap::new();
        endpoints.insert(id_a.clone(), endpoint_a);
        endpoints.insert(id_b.clone(), endpoint_b);

        let mut counterparties = HashMap::new();
        counterparties.insert(id_a.clone(), id_b.clone());
        counterparties.insert(id_b.clone(), id_a.clone());

        let mut pending = HashMap::new();
        pending.insert(id_a, VecDeque::new());
        pending.insert(id_b, VecDeque::new());

        let engine = Self {
            chains,
            endpoints,
            counterparties,
            log,
            pending,
            audit: Some(DelayAudit::new()),
            max_delay: config.max_delay,
            #[cfg(feature = "metrics")]
            metrics: Arc::new(RelayerMetrics::new()?),
            shutdown,
        };

        Ok((engine, shutdown_sender))
    }

    pub fn max_delay(&self) -> u64 {
        self.max_delay
    }

    /// The submission history, when auditing is enabled.
    pub fn audit(&self) -> Option<&DelayAudit> {
        self.audit.as_ref()
    }

    /// Enable or disable the submission history. Relay behavior is
    /// identical either way.
    pub fn set_audit_enabled(&mut self, enabled: bool) {
        if enabled {
            self.audit.get_or_insert_with(DelayAudit::new);
        } else {
            self.audit = None;
        }
    }

    /// Datagrams currently awaiting submission to `chain_id`, in order.
    pub fn pending_datagrams(&self, chain_id: &ChainId) -> Vec<Datagram> {
        self.pending
            .get(chain_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Arc<RelayerMetrics> {
        self.metrics.clone()
    }

    fn chain(&self, chain_id: &ChainId) -> Result<Arc<dyn Chain>> {
        self.chains
            .get(chain_id)
            .cloned()
            .ok_or_else(|| RelayError::UnknownChain(chain_id.clone()))
    }

    /// The other chain of the pairing.
    pub fn counterparty_of(&self, chain_id: &ChainId) -> Result<&ChainId> {
        self.counterparties
            .get(chain_id)
            .ok_or_else(|| RelayError::UnknownChain(chain_id.clone()))
    }

    /// Drain one packet log entry into the pending queue of its
    /// destination chain.
    ///
    /// The entry is consumed regardless of whether it maps to a
    /// datagram. Returns the enqueued datagram, or `None` when the log
    /// was empty or the entry kind has no datagram mapping.
    pub async fn relay_next_event(&mut self) -> Result<Option<Datagram>> {
        let Some(entry) = self.log.pop_front() else {
            return Ok(None);
        };

        let src_id = entry.source_chain.clone();
        let dst_id = self.counterparty_of(&src_id)?.clone();
        let src_chain = self.chain(&src_id)?;
        let proof_height = src_chain.latest_height().await?;

        let src_endpoint = self
            .endpoints
            .get(&src_id)
            .ok_or_else(|| RelayError::UnknownChain(src_id.clone()))?;
        let dst_endpoint = self
            .endpoints
            .get(&dst_id)
            .ok_or_else(|| RelayError::UnknownChain(dst_id.clone()))?;

        let Some(datagram) = make_datagram(src_endpoint, dst_endpoint, &entry, proof_height)
        else {
            return Ok(None);
        };

        info!(
            "queued datagram seq={} proof_height={} for {}",
            datagram.sequence(),
            proof_height,
            dst_id
        );

        if let Some(queue) = self.pending.get_mut(&dst_id) {
            queue.push_back(datagram.clone());
        }
        #[cfg(feature = "metrics")]
        self.metrics.events_relayed.inc();

        Ok(Some(datagram))
    }

    /// Apply the admission state machine to the head of `chain_id`'s
    /// pending queue. Strict FIFO: only the head is ever examined, and
    /// a head whose height is missing or under delay blocks everything
    /// behind it.
    pub async fn process_head(&mut self, chain_id: &ChainId) -> Result<GateOutcome> {
        let chain = self.chain(chain_id)?;

        let Some(head) = self
            .pending
            .get(chain_id)
            .and_then(|queue| queue.front())
            .cloned()
        else {
            return Ok(GateOutcome::Idle);
        };

        let height = head.proof_height();
        let installed_at = chain.client_height_timestamp(height).await?;
        let now = chain.local_timestamp().await?;

        match gate::evaluate(installed_at, now, self.max_delay) {
            GateDecision::Install => {
                let at = chain.install_client_height(height).await?;
                info!("installed client height {} on {} at t={}", height, chain_id, at);
                #[cfg(feature = "metrics")]
                self.metrics.heights_installed.inc();
                Ok(GateOutcome::Installed { height, at })
            }
            GateDecision::Hold { ready_at } => {
                debug!(
                    "holding datagram seq={} for {}: height {} ready at t={}",
                    head.sequence(),
                    chain_id,
                    height,
                    ready_at
                );
                #[cfg(feature = "metrics")]
                self.metrics.datagrams_held.inc();
                Ok(GateOutcome::Held { height, ready_at })
            }
            GateDecision::Release => {
                if let Some(queue) = self.pending.get_mut(chain_id) {
                    if let Some(datagram) = queue.pop_front() {
                        chain.deliver(datagram).await?;
                    }
                }
                if let Some(audit) = self.audit.as_mut() {
                    audit.record(chain_id, height, now);
                }
                info!(
                    "submitted datagram seq={} to {} at t={} (proof height {})",
                    head.sequence(),
                    chain_id,
                    now,
                    height
                );
                #[cfg(feature = "metrics")]
                self.metrics.datagrams_submitted.inc();
                Ok(GateOutcome::Submitted { height, at: now })
            }
        }
    }

    /// Ambient client update: learn the counterparty's current height
    /// and install it on `chain_id` if absent. Same install-once
    /// discipline as the gate's install arm; an already-installed
    /// height is left untouched.
    ///
    /// Returns the install stamp when a write happened.
    pub async fn update_client(&mut self, chain_id: &ChainId) -> Result<Option<u64>> {
        let chain = self.chain(chain_id)?;
        let counterparty_id = self.counterparty_of(chain_id)?.clone();
        let counterparty = self.chain(&counterparty_id)?;

        let height = counterparty.latest_height().await?;
        if chain.client_height_timestamp(height).await?.is_some() {
            return Ok(None);
        }

        let at = chain.install_client_height(height).await?;
        debug!(
            "client update on {}: installed {} height {} at t={}",
            chain_id, counterparty_id, height, at
        );
        #[cfg(feature = "metrics")]
        self.metrics.heights_installed.inc();
        Ok(Some(at))
    }

    /// Actions whose preconditions currently hold. `UpdateClient` is
    /// always enabled; a held queue head still counts as enabled here
    /// since examining it is a harmless no-op.
    pub fn enabled_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.log.is_empty() {
            actions.push(Action::RelayEvent);
        }
        for (chain_id, queue) in &self.pending {
            if !queue.is_empty() {
                actions.push(Action::ProcessHead(chain_id.clone()));
            }
        }
        for chain_id in self.chains.keys() {
            actions.push(Action::UpdateClient(chain_id.clone()));
        }
        actions
    }

    /// Fire one enabled action, picked uniformly at random. Returns the
    /// action fired, or `None` when nothing was enabled.
    pub async fn step(&mut self) -> Result<Option<Action>> {
        let actions = self.enabled_actions();
        if actions.is_empty() {
            return Ok(None);
        }
        let action = actions[fastrand::usize(..actions.len())].clone();
        self.apply(&action).await?;
        Ok(Some(action))
    }

    /// Fire a specific action.
    pub async fn apply(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::RelayEvent => {
                self.relay_next_event().await?;
            }
            Action::ProcessHead(chain_id) => {
                self.process_head(chain_id).await?;
            }
            Action::UpdateClient(chain_id) => {
                self.update_client(chain_id).await?;
            }
        }
        Ok(())
    }

    /// Drive the scheduler until shutdown is signalled.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "starting delay-gated relay engine ({} chains, max_delay={})",
            self.chains.len(),
            self.max_delay
        );

        let mut shutdown = self.shutdown.clone();
        let mut tick = time::interval(Duration::from_millis(10));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.step().await?;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("relay engine shutdown requested");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
