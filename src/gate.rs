use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::ClassificationResult;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Which classifications are allowed to produce a notification at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Only "tickets available" results notify. Used by the one-shot check.
    AvailableOnly,
    /// Sold-out results notify too. Used by the long-running watcher.
    AnyStatus,
}

/// Something that knows what time it is.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Cooldown-based suppression of repeated notifications.
///
/// State lives for the lifetime of the process only. The caller passes the
/// current time in, so the gate never reads a clock itself.
#[derive(Debug, Clone)]
pub struct NotificationGate {
    cooldown: Duration,
    policy: NotifyPolicy,
    last_notification_time: Option<DateTime<Utc>>,
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl NotificationGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            policy: NotifyPolicy::AvailableOnly,
            last_notification_time: None,
        }
    }

    pub fn with_policy(mut self, policy: NotifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: NotifyPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    pub fn last_notification_time(&self) -> Option<DateTime<Utc>> {
        self.last_notification_time
    }

    pub fn should_notify(&self, classification: &ClassificationResult, now: DateTime<Utc>) -> bool {
        if classification.is_sold_out && self.policy == NotifyPolicy::AvailableOnly {
            return false;
        }

        self.cooldown_remaining(now).is_none()
    }

    /// Time left before another notification may go out, or `None` once the
    /// cooldown has elapsed. A clock that went backwards keeps the whole
    /// cooldown in force.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_notification_time?;

        match now.signed_duration_since(last).to_std() {
            Ok(elapsed) if elapsed >= self.cooldown => None,
            Ok(elapsed) => Some(self.cooldown - elapsed),
            Err(_) => Some(self.cooldown),
        }
    }

    /// Call only after a confirmed delivery.
    pub fn record_sent(&mut self, now: DateTime<Utc>) {
        self.last_notification_time = Some(now);
    }
}
