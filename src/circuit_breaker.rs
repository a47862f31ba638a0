use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::CircuitBreakerConfig;

// Guards the weather endpoint: after enough consecutive failures calls are refused until
// the reset timeout passes, then a few trial calls decide whether to close again.
pub struct CircuitBreaker {
    failure_threshold: u32,
    success_threshold: u32,
    open_duration: Duration,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

enum State {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { successes: u32 },
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            success_threshold: config.success_threshold.max(1),
            open_duration: Duration::from_millis(config.reset_timeout_ms),
            state: State::Closed { failures: 0 },
        }
    }

    pub fn state(&self) -> BreakerState {
        match self.state {
            State::Closed { .. } => BreakerState::Closed,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed { .. })
    }

    // Remaining wait before an open breaker lets a trial call through
    pub fn retry_after(&self) -> Option<Duration> {
        match self.state {
            State::Open { opened_at } => Some(self.open_duration.saturating_sub(opened_at.elapsed())),
            _ => None,
        }
    }

    pub fn should_allow_call(&mut self) -> bool {
        match &self.state {
            State::Closed { .. } => true,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.open_duration {
                    self.state = State::HalfOpen { successes: 0 };
                    true
                } else {
                    false
                }
            }
            State::HalfOpen { .. } => true,
        }
    }

    pub fn success(&mut self) {
        match &mut self.state {
            State::Closed { failures } => *failures = 0,
            State::HalfOpen { successes } => {
                *successes += 1;
                if *successes >= self.success_threshold {
                    self.state = State::Closed { failures: 0 };
                }
            }
            State::Open { .. } => {}
        }
    }

    pub fn fail(&mut self) {
        match &mut self.state {
            State::Closed { failures } => {
                *failures += 1;
                if *failures >= self.failure_threshold {
                    warn!(failures = *failures, "circuit breaker opened");
                    self.state = State::Open {
                        opened_at: Instant::now(),
                    };
                }
            }
            State::HalfOpen { .. } => {
                warn!("trial call failed, circuit breaker reopened");
                self.state = State::Open {
                    opened_at: Instant::now(),
                };
            }
            State::Open { .. } => {}
        }
    }

    pub fn reset(&mut self) {
        self.state = State::Closed { failures: 0 };
    }
}
