// Admission control for pending datagrams

/// Decision for the head datagram of a pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Proof height not installed on the destination: install it now,
    /// leave the datagram queued.
    Install,
    /// Height installed, mandatory delay not yet strictly elapsed.
    /// No state change; retried once the destination clock advances.
    Hold { ready_at: u64 },
    /// Height installed and the delay has strictly elapsed: submit.
    Release,
}

/// Evaluate the delay gate for one datagram.
///
/// `installed_at` is the install stamp of the datagram's proof height on
/// the destination chain (`None` when not installed), `now` that chain's
/// current local timestamp.
///
/// The comparison is strictly less-than: a height installed at `t` is
/// held at every timestamp up to and including `t + max_delay`, and
/// releasable from `t + max_delay + 1` on. The receiver is guaranteed a
/// full `max_delay` window, not a `max_delay - 1` one.
pub fn evaluate(installed_at: Option<u64>, now: u64, max_delay: u64) -> GateDecision {
    match installed_at {
        None => GateDecision::Install,
        Some(t) if t.saturating_add(max_delay) < now => GateDecision::Release,
        Some(t) => GateDecision::Hold {
            ready_at: t.saturating_add(max_delay).saturating_add(1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_height_installs() {
        assert_eq!(evaluate(None, 0, 5), GateDecision::Install);
        assert_eq!(evaluate(None, 100, 0), GateDecision::Install);
    }

    #[test]
    fn test_strict_boundary() {
        // Installed at t=10 with max_delay=5: 10 + 5 = 15 is not
        // strictly less than 15, so the datagram is still held there.
        assert_eq!(evaluate(Some(10), 15, 5), GateDecision::Hold { ready_at: 16 });
        assert_eq!(evaluate(Some(10), 16, 5), GateDecision::Release);
    }

    #[test]
    fn test_held_throughout_the_window() {
        for now in 10..=15 {
            assert_eq!(evaluate(Some(10), now, 5), GateDecision::Hold { ready_at: 16 });
        }
    }

    #[test]
    fn test_zero_delay_still_requires_one_tick() {
        assert_eq!(evaluate(Some(3), 3, 0), GateDecision::Hold { ready_at: 4 });
        assert_eq!(evaluate(Some(3), 4, 0), GateDecision::Release);
    }

    #[test]
    fn test_saturating_delay_never_releases() {
        assert_eq!(
            evaluate(Some(1), u64::MAX, u64::MAX),
            GateDecision::Hold { ready_at: u64::MAX }
        );
    }
}
