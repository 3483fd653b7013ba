/// Consecutive backend communication failures for the running plan.
#[derive(Debug, Clone)]
pub struct FailureStreak {
    failure_streak: u32,
    limit: u32,
}

impl FailureStreak {
    pub fn new(limit: u32) -> Self {
        Self {
            failure_streak: 0,
            limit: limit.max(1),
        }
    }

    pub fn streak(&self) -> u32 {
        self.failure_streak
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn record_success(&mut self) {
        self.failure_streak = 0;
    }

    /// Returns whether the streak reached the limit.
    pub fn record_failure(&mut self) -> bool {
        self.failure_streak = self.failure_streak.saturating_add(1);
        self.failure_streak >= self.limit
    }
}
