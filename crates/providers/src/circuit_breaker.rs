use crate::traits::ProviderError;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed { failures: usize },
    Open { since: Instant },
    /// One trial request is in flight after the cooldown.
    HalfOpen,
}

/// Opens after `failure_threshold` consecutive failed calls. Once `cooldown`
/// has elapsed a single trial request is let through; its result closes or
/// reopens the breaker.
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    failure_threshold: usize,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: usize, cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn record_success(&self) {
        *self.state.lock() = BreakerState::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        *state = match *state {
            BreakerState::Closed { failures } if failures + 1 < self.failure_threshold => {
                BreakerState::Closed {
                    failures: failures + 1,
                }
            }
            _ => BreakerState::Open {
                since: Instant::now(),
            },
        };
    }

    pub fn check(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        match *state {
            BreakerState::Closed { .. } => Ok(()),
            BreakerState::Open { since } if since.elapsed() >= self.cooldown => {
                *state = BreakerState::HalfOpen;
                Ok(())
            }
            BreakerState::Open { .. } | BreakerState::HalfOpen => Err(
                ProviderError::Unavailable("circuit breaker open".to_string()),
            ),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}
