use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::domain::time_window::seconds_until;
use crate::domain::types::CONTACT_EMAIL_COOLDOWN_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
    pub block_duration: Duration,
}

impl RateLimitPolicy {
    pub fn new(window_secs: i64, max_requests: u32, block_secs: i64) -> Self {
        Self {
            window: Duration::seconds(window_secs),
            max_requests,
            block_duration: Duration::seconds(block_secs),
        }
    }
}

impl Default for RateLimitPolicy {
    /// 5 requests per minute, then a 15 minute block.
    fn default() -> Self {
        Self::new(60, 5, 900)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Blocked { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Clone)]
struct WindowRecord {
    window_start: DateTime<Utc>,
    count: u32,
    blocked_until: Option<DateTime<Utc>>,
}

impl WindowRecord {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            count: 1,
            blocked_until: None,
        }
    }
}

/// Fixed-window limiter with a hard block once the window overflows.
///
/// Keyed by an opaque identity (client IP for the contact form). A check holds
/// the key's shard lock for its whole read-modify-write.
#[derive(Debug, Default)]
pub struct AbuseRateLimiter {
    policy: RateLimitPolicy,
    records: DashMap<String, WindowRecord>,
}

impl AbuseRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            records: DashMap::new(),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn check(&self, identity: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut record = match self.records.entry(identity.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(WindowRecord::fresh(now));
                return RateLimitDecision::Allowed;
            }
            Entry::Occupied(slot) => slot.into_ref(),
        };

        if let Some(blocked_until) = record.blocked_until {
            if blocked_until > now {
                return RateLimitDecision::Blocked {
                    retry_after_secs: seconds_until(blocked_until, now),
                };
            }
            *record = WindowRecord::fresh(now);
            return RateLimitDecision::Allowed;
        }

        if now - record.window_start > self.policy.window {
            *record = WindowRecord::fresh(now);
            return RateLimitDecision::Allowed;
        }

        record.count += 1;
        if record.count > self.policy.max_requests {
            record.blocked_until = Some(now + self.policy.block_duration);
            return RateLimitDecision::Blocked {
                retry_after_secs: self.policy.block_duration.num_seconds().max(0) as u64,
            };
        }
        RateLimitDecision::Allowed
    }

    /// Drop records whose window and any block have both run out.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let lifetime = self.policy.window + self.policy.block_duration;
        let before = self.records.len();
        self.records.retain(|_, r| {
            r.window_start + lifetime > now || r.blocked_until.is_some_and(|b| b > now)
        });
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Minimum gap between accepted submissions from the same email.
#[derive(Debug)]
pub struct SubmissionCooldown {
    cooldown: Duration,
    last_accepted: DashMap<String, DateTime<Utc>>,
}

impl Default for SubmissionCooldown {
    fn default() -> Self {
        Self::new(Duration::seconds(CONTACT_EMAIL_COOLDOWN_SECS))
    }
}

impl SubmissionCooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: DashMap::new(),
        }
    }

    /// Allow and record `now` for `key`, or deny with the seconds left.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        match self.last_accepted.entry(key.to_owned()) {
            Entry::Occupied(mut slot) => {
                let remaining = seconds_until(*slot.get() + self.cooldown, now);
                if remaining > 0 {
                    return RateLimitDecision::Blocked {
                        retry_after_secs: remaining,
                    };
                }
                slot.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }
        RateLimitDecision::Allowed
    }

    /// Release a key recorded by a submission that was not stored.
    pub fn forget(&self, key: &str) {
        self.last_accepted.remove(key);
    }

    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.last_accepted.len();
        self.last_accepted
            .retain(|_, last| *last + self.cooldown > now);
        before.saturating_sub(self.last_accepted.len())
    }
}

/// Per-instance limiter state for the contact form, shared through `Arc`.
#[derive(Debug, Default)]
pub struct RateLimiterState {
    pub limiter: AbuseRateLimiter,
    pub cooldown: SubmissionCooldown,
}

impl RateLimiterState {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            limiter: AbuseRateLimiter::new(policy),
            cooldown: SubmissionCooldown::default(),
        }
    }

    /// Evict stale entries from both maps. Returns how many were dropped.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.limiter.sweep(now) + self.cooldown.sweep(now)
    }
}
