// Per-session login throttle
// Decision: Throttle bookkeeping is its own value, composed into the session rather than inlined
// Decision: Default reset policy re-evaluates the window only on the attempt that reaches the limit
//
// The attempt is recorded unconditionally on every login submission, before the
// blocked flag is consulted, so an attempt landing just after the window expired
// restarts the window instead of being dropped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Attempts allowed inside one window before the session is blocked
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Length of the throttle window in milliseconds
pub const DEFAULT_WINDOW_MS: i64 = 60_000;

/// When an elapsed window is noticed and restarted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowResetPolicy {
    /// Only the attempt that reaches the limit checks whether the window has
    /// elapsed. Attempts below the limit never restart an old window.
    #[default]
    OnLimit,
    /// Every attempt checks the window first and restarts it once elapsed.
    EveryAttempt,
}

impl WindowResetPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "on_limit" | "on-limit" | "onlimit" => Some(Self::OnLimit),
            "every_attempt" | "every-attempt" | "everyattempt" => Some(Self::EveryAttempt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnLimit => "on_limit",
            Self::EveryAttempt => "every_attempt",
        }
    }
}

/// Throttle limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub max_attempts: u32,
    pub window: Duration,
    pub policy: WindowResetPolicy,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: Duration::milliseconds(DEFAULT_WINDOW_MS),
            policy: WindowResetPolicy::OnLimit,
        }
    }
}

/// Login attempt bookkeeping for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginThrottleState {
    pub first_attempt_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub attempt_count: u32,
    pub blocked: bool,
}

impl LoginThrottleState {
    /// Record one login attempt made at `now`.
    pub fn record_attempt(&mut self, now: DateTime<Utc>, config: &ThrottleConfig) {
        let Some(first) = self.first_attempt_at else {
            self.start_window(now);
            return;
        };

        if config.policy == WindowResetPolicy::EveryAttempt && now - first >= config.window {
            self.start_window(now);
            return;
        }

        self.attempt_count = self.attempt_count.saturating_add(1);
        self.last_attempt_at = Some(now);

        if self.attempt_count >= config.max_attempts {
            if now - first < config.window {
                self.blocked = true;
            } else {
                self.start_window(now);
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Time left until an attempt would be judged outside the current window.
    /// `None` when not blocked.
    pub fn retry_after(&self, now: DateTime<Utc>, config: &ThrottleConfig) -> Option<Duration> {
        if !self.blocked {
            return None;
        }
        let first = self.first_attempt_at?;
        let remaining = first + config.window - now;
        Some(remaining.max(Duration::zero()))
    }

    fn start_window(&mut self, now: DateTime<Utc>) {
        self.first_attempt_at = Some(now);
        self.last_attempt_at = Some(now);
        self.attempt_count = 1;
        self.blocked = false;
    }
}
