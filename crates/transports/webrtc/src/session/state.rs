//! Session lifecycle states

use std::fmt;

/// Lifecycle of a [`PeerSession`](super::PeerSession)
///
/// `Created → AwaitingOffer → Negotiating → GatheringCandidates → Answered →
/// Relaying → Closed`. Any state may move to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection object exists, track not yet attached
    Created,
    /// Track attached, waiting for the remote offer
    AwaitingOffer,
    /// Offer applied as remote description
    Negotiating,
    /// Answer applied locally, ICE candidates being gathered
    GatheringCandidates,
    /// Finalized answer sent to the remote side
    Answered,
    /// Media relay running
    Relaying,
    /// Session over
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (Created, AwaitingOffer)
                | (AwaitingOffer, Negotiating)
                | (Negotiating, GatheringCandidates)
                | (GatheringCandidates, Answered)
                | (Answered, Relaying)
        ) || (next == Closed && *self != Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Created => "created",
            SessionState::AwaitingOffer => "awaiting-offer",
            SessionState::Negotiating => "negotiating",
            SessionState::GatheringCandidates => "gathering-candidates",
            SessionState::Answered => "answered",
            SessionState::Relaying => "relaying",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;

    #[test]
    fn test_forward_path() {
        let path = [
            Created,
            AwaitingOffer,
            Negotiating,
            GatheringCandidates,
            Answered,
            Relaying,
            Closed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!AwaitingOffer.can_transition_to(Answered));
        assert!(!Negotiating.can_transition_to(AwaitingOffer));
        assert!(!Answered.can_transition_to(Negotiating));
        assert!(!Relaying.can_transition_to(Answered));
    }

    #[test]
    fn test_closed_is_final() {
        assert!(Negotiating.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(AwaitingOffer));
    }
}
