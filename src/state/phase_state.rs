/// Phase state definitions for the browse and harvest loops
use std::fmt;

/// Represents the current state of a crawl phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseState {
    /// The work queue has been seeded but nothing was dequeued yet
    Seeded,

    /// Items are being dequeued and processed
    Running,

    /// The last dequeue returned no item; the loop is backing off
    Paused,

    /// The phase finished (stop predicate, exhausted queue or cancellation)
    Stopped,
}

impl PhaseState {
    /// Returns true if no further work happens in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true if the loop is still consuming its queue
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// Any non-terminal state may stop. Re-entering the current state is
    /// allowed so that consecutive pauses or consecutive successful dequeues
    /// do not need special casing.
    pub fn can_transition_to(&self, next: PhaseState) -> bool {
        use PhaseState::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Seeded, Running) | (Seeded, Paused) => true,
            (Running, Running) | (Running, Paused) => true,
            (Paused, Paused) | (Paused, Running) => true,
            _ => false,
        }
    }

    /// Returns a short lowercase name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Returns all possible phase states
    pub fn all_states() -> Vec<PhaseState> {
        vec![Self::Seeded, Self::Running, Self::Paused, Self::Stopped]
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
