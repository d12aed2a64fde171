// Submission history used to check the delay invariant

use std::collections::HashMap;

use crate::chains::ChainId;

/// First-submission timestamps per (chain, proof height).
///
/// Observability only: the engine behaves identically with the table
/// absent. Entries are written at most once per key and never
/// overwritten, so the recorded stamp is always the earliest submission
/// that referenced the height.
#[derive(Debug, Default)]
pub struct DelayAudit {
    submissions: HashMap<(ChainId, u64), u64>,
}

impl DelayAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submission referencing `height` on `chain`. Later
    /// duplicates leave the existing stamp untouched.
    pub fn record(&mut self, chain: &ChainId, height: u64, submitted_at: u64) {
        self.submissions
            .entry((chain.clone(), height))
            .or_insert(submitted_at);
    }

    pub fn first_submission(&self, chain: &ChainId, height: u64) -> Option<u64> {
        self.submissions.get(&(chain.clone(), height)).copied()
    }

    /// Whether the recorded submission for `(chain, height)` respects
    /// the delay relative to `installed_at`. Heights with no recorded
    /// submission trivially pass.
    pub fn respects_delay(
        &self,
        chain: &ChainId,
        height: u64,
        installed_at: u64,
        max_delay: u64,
    ) -> bool {
        self.first_submission(chain, height)
            .map_or(true, |submitted| {
                submitted >= installed_at.saturating_add(max_delay)
            })
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}
