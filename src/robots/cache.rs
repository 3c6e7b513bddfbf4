//! robots.txt cache entry with a 24 hour lifetime

use crate::robots::RobotsRules;
use chrono::{DateTime, Duration, Utc};

/// robots.txt rules together with the time they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps freshly fetched rules
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true once the entry is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    /// Time elapsed since the rules were fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry() {
        let cached = CachedRobots::new(RobotsRules::allow_all());
        assert!(!cached.is_stale());
        assert!(cached.age() < Duration::minutes(1));
    }

    #[test]
    fn test_stale_after_a_day() {
        let mut cached = CachedRobots::new(RobotsRules::allow_all());
        cached.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cached.is_stale());

        cached.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cached.is_stale());
    }
}
