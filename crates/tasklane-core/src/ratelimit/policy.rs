//! Static rate-limit table and the two limiting algorithms.
//!
//! Both algorithms are pure transitions over a [`CounterState`]; stores only
//! decide where the state lives and how the read-modify-write is made atomic.

use crate::clock::ONE_HOUR_MS;

const ONE_MINUTE_MS: i64 = 60 * 1000;

/// How a quota is enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Algorithm {
    /// Lazily refilled bucket: `rate` tokens per `period_ms`, holding at most
    /// `capacity`. A new key starts full.
    TokenBucket {
        rate: f64,
        period_ms: i64,
        capacity: f64,
    },
    /// At most `rate` requests per window; windows start at multiples of
    /// `period_ms` since the epoch.
    FixedWindow { rate: u32, period_ms: i64 },
}

/// Every rate-limited action and its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    CreateTask,
    UpdateTask,
    DeleteTask,
    CreateComment,
    UpdateComment,
    DeleteComment,
    UpdatePreferences,
    Signup,
    Login,
}

impl RateLimitAction {
    pub const ALL: [Self; 9] = [
        Self::CreateTask,
        Self::UpdateTask,
        Self::DeleteTask,
        Self::CreateComment,
        Self::UpdateComment,
        Self::DeleteComment,
        Self::UpdatePreferences,
        Self::Signup,
        Self::Login,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTask => "createTask",
            Self::UpdateTask => "updateTask",
            Self::DeleteTask => "deleteTask",
            Self::CreateComment => "createComment",
            Self::UpdateComment => "updateComment",
            Self::DeleteComment => "deleteComment",
            Self::UpdatePreferences => "updatePreferences",
            Self::Signup => "signup",
            Self::Login => "login",
        }
    }

    #[must_use]
    pub fn algorithm(self) -> Algorithm {
        fn bucket(rate: u32, capacity: u32) -> Algorithm {
            Algorithm::TokenBucket {
                rate: f64::from(rate),
                period_ms: ONE_MINUTE_MS,
                capacity: f64::from(capacity),
            }
        }

        match self {
            Self::CreateTask => bucket(30, 5),
            Self::UpdateTask => bucket(60, 10),
            Self::DeleteTask => bucket(20, 3),
            Self::CreateComment => bucket(20, 3),
            Self::UpdateComment => bucket(30, 5),
            Self::DeleteComment => bucket(15, 3),
            Self::UpdatePreferences => bucket(10, 2),
            Self::Signup => Algorithm::FixedWindow {
                rate: 5,
                period_ms: ONE_HOUR_MS,
            },
            Self::Login => Algorithm::FixedWindow {
                rate: 10,
                period_ms: ONE_MINUTE_MS,
            },
        }
    }
}

impl std::fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted limiter state for one (action, identity) key.
///
/// For a token bucket `value` is the token count at `stamp_ms`. For a fixed
/// window `value` is the request count and `stamp_ms` the window start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterState {
    pub value: f64,
    pub stamp_ms: i64,
}

/// Outcome of one limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Zero when allowed; otherwise the delay before a retry can succeed.
    pub retry_after_ms: u64,
}

impl Decision {
    pub const ALLOW: Self = Self {
        allowed: true,
        retry_after_ms: 0,
    };

    #[must_use]
    pub const fn deny(retry_after_ms: u64) -> Self {
        Self {
            allowed: false,
            retry_after_ms,
        }
    }
}

impl Algorithm {
    /// Apply one request at `now_ms` to `previous`, returning the state to
    /// store and the decision.
    #[must_use]
    pub fn apply(self, previous: Option<CounterState>, now_ms: i64) -> (CounterState, Decision) {
        match self {
            Self::TokenBucket {
                rate,
                period_ms,
                capacity,
            } => token_bucket(rate, period_ms, capacity, previous, now_ms),
            Self::FixedWindow { rate, period_ms } => {
                fixed_window(rate, period_ms, previous, now_ms)
            }
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn token_bucket(
    rate: f64,
    period_ms: i64,
    capacity: f64,
    previous: Option<CounterState>,
    now_ms: i64,
) -> (CounterState, Decision) {
    let period = period_ms as f64;
    let tokens = previous.map_or(capacity, |state| {
        // A clock that moved backwards refills nothing.
        let elapsed = (now_ms - state.stamp_ms).max(0) as f64;
        (state.value + elapsed * rate / period).min(capacity)
    });

    if tokens >= 1.0 {
        let state = CounterState {
            value: tokens - 1.0,
            stamp_ms: now_ms,
        };
        return (state, Decision::ALLOW);
    }

    let wait_ms = ((1.0 - tokens) * period / rate).ceil().max(1.0) as u64;
    let state = CounterState {
        value: tokens,
        stamp_ms: now_ms,
    };
    (state, Decision::deny(wait_ms))
}

#[allow(clippy::cast_sign_loss)]
fn fixed_window(
    rate: u32,
    period_ms: i64,
    previous: Option<CounterState>,
    now_ms: i64,
) -> (CounterState, Decision) {
    let window_start = now_ms - now_ms.rem_euclid(period_ms);
    let used = previous
        .filter(|state| state.stamp_ms == window_start)
        .map_or(0.0, |state| state.value);

    if used < f64::from(rate) {
        let state = CounterState {
            value: used + 1.0,
            stamp_ms: window_start,
        };
        return (state, Decision::ALLOW);
    }

    let state = CounterState {
        value: used,
        stamp_ms: window_start,
    };
    (state, Decision::deny((window_start + period_ms - now_ms) as u64))
}
