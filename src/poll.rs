use std::time::Duration;

use async_trait::async_trait;

use crate::contract::Sleeper;

/// Time spent polling in one stage, measured in poll intervals rather than wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    elapsed: Duration,
    timeout: Duration,
}

impl PollBudget {
    pub fn new(timeout: Duration) -> Self {
        PollBudget {
            elapsed: Duration::ZERO,
            timeout,
        }
    }

    pub fn charge(&mut self, interval: Duration) {
        self.elapsed = self.elapsed.saturating_add(interval);
    }

    /// True once strictly more than the timeout has been spent.
    pub fn is_exhausted(&self) -> bool {
        self.elapsed > self.timeout
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sleeps one interval and charges it.
    pub async fn wait<S>(&mut self, sleeper: &S, interval: Duration)
    where
        S: Sleeper + ?Sized,
    {
        sleeper.sleep(interval).await;
        self.charge(interval);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
