//! Bounded retry policy for transport detection

use crate::bridge::TransportState;
use crate::error::{BridgeError, BridgeResult};
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

/// How long and how often to wait for the bridge transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after `start` before the first probe
    pub grace: Duration,
    /// Delay between probes
    pub interval: Duration,
    pub max_attempts: u32,
    /// Ceiling for the whole attempt, start included
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(500),
            interval: Duration::from_secs(1),
            max_attempts: 10,
            deadline: Duration::from_secs(12),
        }
    }
}

impl RetryPolicy {
    /// Longest time polling can take without hitting the deadline
    pub fn polling_budget(&self) -> Duration {
        self.grace + self.interval * self.max_attempts
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    /// Transport opened on the given attempt (1-based)
    Open { attempt: u32 },
    Exhausted,
    Failed(BridgeError),
}

/// Probe until the transport opens or attempts run out
///
/// The deadline is not applied here; callers race the whole attempt against it.
pub async fn poll_until_open<F>(policy: &RetryPolicy, mut probe: F) -> PollOutcome
where
    F: FnMut() -> BridgeResult<TransportState>,
{
    sleep(policy.grace).await;

    for attempt in 1..=policy.max_attempts {
        match probe() {
            Ok(TransportState::Open) => return PollOutcome::Open { attempt },
            Ok(state) => trace!(attempt, ?state, "Transport not open yet"),
            Err(e) => return PollOutcome::Failed(e),
        }
        sleep(policy.interval).await;
    }

    PollOutcome::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_opens_on_third_probe() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let started = Instant::now();

        let outcome = poll_until_open(&policy, || {
            calls += 1;
            Ok(if calls == 3 {
                TransportState::Open
            } else {
                TransportState::Connecting
            })
        })
        .await;

        assert!(matches!(outcome, PollOutcome::Open { attempt: 3 }));
        // grace + two intervals
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let outcome = poll_until_open(&policy, || {
            calls += 1;
            Ok(TransportState::Connecting)
        })
        .await;

        assert!(matches!(outcome, PollOutcome::Exhausted));
        assert_eq!(calls, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_stops_polling() {
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let outcome = poll_until_open(&policy, || {
            calls += 1;
            Err(BridgeError::Transport("bridge gone".into()))
        })
        .await;

        assert!(matches!(outcome, PollOutcome::Failed(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_default_budget_fits_deadline() {
        let policy = RetryPolicy::default();
        assert!(policy.polling_budget() < policy.deadline);
    }
}
