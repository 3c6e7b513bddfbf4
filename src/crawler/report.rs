//! Per-phase outcome counters

use crate::state::PhaseState;
use std::fmt;

/// The three crawl phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Browse,
    Harvest,
    Extract,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Browse => "browse",
            Self::Harvest => "harvest",
            Self::Extract => "extract",
        };
        write!(f, "{}", name)
    }
}

/// What a phase did before it stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub state: PhaseState,
    /// The phase ended because the cancellation token fired
    pub cancelled: bool,
    pub dequeued: usize,
    pub downloaded: usize,
    pub denied: usize,
    pub retried: usize,
    pub dropped: usize,
    /// New items added to a queue
    pub discovered: usize,
    pub archived: usize,
    /// Archive entries consumed by the extract phase
    pub extracted: usize,
    pub records_written: usize,
    pub parse_failures: usize,
    pub pauses: usize,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            state: PhaseState::Seeded,
            cancelled: false,
            dequeued: 0,
            downloaded: 0,
            denied: 0,
            retried: 0,
            dropped: 0,
            discovered: 0,
            archived: 0,
            extracted: 0,
            records_written: 0,
            parse_failures: 0,
            pauses: 0,
        }
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Browse => write!(
                f,
                "browse: {} dequeued, {} downloaded, {} discovered, {} denied, {} retried, {} dropped",
                self.dequeued, self.downloaded, self.discovered, self.denied, self.retried, self.dropped
            ),
            Phase::Harvest => write!(
                f,
                "harvest: {} dequeued, {} archived, {} denied, {} retried, {} dropped",
                self.dequeued, self.archived, self.denied, self.retried, self.dropped
            ),
            Phase::Extract => write!(
                f,
                "extract: {} entries, {} records written, {} parse failures",
                self.extracted, self.records_written, self.parse_failures
            ),
        }?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_seeded() {
        let report = PhaseReport::new(Phase::Harvest);
        assert_eq!(report.state, PhaseState::Seeded);
        assert!(!report.cancelled);
        assert_eq!(report.archived, 0);
    }

    #[test]
    fn test_display() {
        let mut report = PhaseReport::new(Phase::Extract);
        report.extracted = 3;
        report.records_written = 2;
        report.parse_failures = 1;
        assert_eq!(
            report.to_string(),
            "extract: 3 entries, 2 records written, 1 parse failures"
        );

        report.cancelled = true;
        assert!(report.to_string().ends_with("(cancelled)"));
    }
}
