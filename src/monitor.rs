use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::classifier::StatusClassifier;
use crate::config::MonitorConfig;
use crate::gate::{Clock, NotificationGate, NotifyPolicy, SystemClock};
use crate::message;
use crate::models::{CheckOutcome, ClassificationResult};
use crate::plugins::NotifierPlugin;
use crate::scraper::PageSource;
use crate::utils::error::Result;

/// Process exit codes. Schedulers branch on these without parsing output.
pub mod exit_codes {
    pub const SOLD_OUT: i32 = 0;
    pub const AVAILABLE: i32 = 1;
    pub const CHECK_FAILED: i32 = 1;
    pub const CONFIGURATION_ERROR: i32 = 2;
    pub const UNEXPECTED_ERROR: i32 = 3;

    pub const WATCH_STOPPED: i32 = 0;
    pub const WATCH_FAILED: i32 = 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Initializing,
    Checking,
    Notifying,
    Sleeping,
    Stopped,
}

/// Verdict of a one-shot check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    SoldOut,
    Available,
    CheckFailed,
}

impl CheckStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            CheckStatus::SoldOut => exit_codes::SOLD_OUT,
            CheckStatus::Available => exit_codes::AVAILABLE,
            CheckStatus::CheckFailed => exit_codes::CHECK_FAILED,
        }
    }
}

/// How the continuous watcher ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    Stopped,
    InitialCheckFailed,
}

impl WatchExit {
    pub fn exit_code(self) -> i32 {
        match self {
            WatchExit::Stopped => exit_codes::WATCH_STOPPED,
            WatchExit::InitialCheckFailed => exit_codes::WATCH_FAILED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent { message_id: Option<String> },
    /// Cooldown still running.
    Suppressed { remaining_secs: u64 },
    /// No access token configured.
    Disabled,
    Failed { error: String },
    /// Nothing to notify about for this outcome.
    Skipped,
}

impl NotificationOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub outcome: CheckOutcome,
    pub notification: NotificationOutcome,
}

impl CycleReport {
    pub fn check_status(&self) -> CheckStatus {
        match self.outcome.classification() {
            None => CheckStatus::CheckFailed,
            Some(c) if c.is_sold_out => CheckStatus::SoldOut,
            Some(_) => CheckStatus::Available,
        }
    }
}

/// Drives fetch → classify → gate → notify, once or on an interval.
pub struct TicketMonitor {
    config: MonitorConfig,
    source: Arc<dyn PageSource>,
    notifier: Option<Arc<dyn NotifierPlugin>>,
    classifier: StatusClassifier,
    gate: NotificationGate,
    clock: Arc<dyn Clock>,
    state: MonitorState,
}

impl TicketMonitor {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn PageSource>,
        notifier: Option<Arc<dyn NotifierPlugin>>,
    ) -> Self {
        let gate = NotificationGate::new(config.notification_cooldown);

        Self {
            config,
            source,
            notifier,
            classifier: StatusClassifier::new(),
            gate,
            clock: Arc::new(SystemClock),
            state: MonitorState::Initializing,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "Monitor state change");
            self.state = next;
        }
    }

    /// Fetch and classify. Fetch failures come back as a failed outcome;
    /// any other error is returned.
    pub async fn check(&mut self) -> Result<CheckOutcome> {
        self.transition(MonitorState::Checking);

        let fetched = self
            .source
            .fetch_elements(&self.config.target_url, &self.config.target_selector)
            .await;

        match fetched {
            Ok(elements) => {
                let classification = self.classifier.classify(&elements);
                log_classification(&classification);
                Ok(CheckOutcome::checked(classification))
            }
            Err(e) if e.is_fetch_failure() => {
                tracing::warn!(error = %e, "Page check failed");
                Ok(CheckOutcome::failed(format!("Failed to fetch page: {}", e)))
            }
            Err(e) => Err(e),
        }
    }

    async fn deliver(
        &mut self,
        message: &str,
        classification: &ClassificationResult,
        now: DateTime<Utc>,
    ) -> NotificationOutcome {
        self.transition(MonitorState::Notifying);

        let Some(notifier) = self.notifier.clone() else {
            tracing::debug!("Notifications disabled: no LINE access token configured");
            return NotificationOutcome::Disabled;
        };

        if !self.gate.should_notify(classification, now) {
            return match self.gate.cooldown_remaining(now) {
                Some(remaining) => {
                    tracing::info!(
                        remaining_secs = remaining.as_secs(),
                        "Notification cooldown active"
                    );
                    NotificationOutcome::Suppressed {
                        remaining_secs: remaining.as_secs(),
                    }
                }
                None => NotificationOutcome::Skipped,
            };
        }

        match notifier.notify(message).await {
            Ok(result) if result.success => {
                self.gate.record_sent(now);
                tracing::info!(
                    notifier = notifier.plugin_type(),
                    message_id = ?result.message_id,
                    "Notification sent"
                );
                NotificationOutcome::Sent {
                    message_id: result.message_id,
                }
            }
            Ok(result) => {
                let error = result
                    .error
                    .unwrap_or_else(|| "rejected without detail".to_string());
                tracing::warn!(notifier = notifier.plugin_type(), %error, "Notification rejected");
                NotificationOutcome::Failed { error }
            }
            Err(e) => {
                tracing::warn!(notifier = notifier.plugin_type(), error = %e, "Notification delivery failed");
                NotificationOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// One-shot check. Sold out is logged only; available triggers one
    /// notification attempt whose failure does not change the verdict.
    pub async fn run_single_check(&mut self) -> Result<CycleReport> {
        self.gate.set_policy(NotifyPolicy::AvailableOnly);

        let cycle_id = Uuid::new_v4();
        let checked_at = self.clock.now();
        tracing::info!(
            url = %self.config.target_url,
            selector = %self.config.target_selector,
            "Starting ticket check"
        );

        let outcome = self.check().await?;

        let notification = match outcome.classification() {
            None => NotificationOutcome::Skipped,
            Some(classification) if classification.is_sold_out => {
                tracing::info!(
                    sold_out_count = classification.sold_out_count(),
                    "Sold out; not sending a notification"
                );
                NotificationOutcome::Skipped
            }
            Some(classification) => {
                tracing::info!("Tickets available; sending notification");
                let now = self.clock.now();
                let text = message::sales_started(&self.config.target_url, now);
                let notification = self.deliver(&text, classification, now).await;
                if !notification.was_sent() {
                    tracing::warn!("Notification was not delivered; check result is unaffected");
                }
                notification
            }
        };

        self.transition(MonitorState::Stopped);

        let report = CycleReport {
            cycle_id,
            checked_at,
            outcome,
            notification,
        };
        tracing::info!(status = ?report.check_status(), "Ticket check complete");
        Ok(report)
    }

    /// One cycle of the continuous watcher. Both states produce a message.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", id = %cycle_id);
        self.cycle(cycle_id).instrument(span).await
    }

    async fn cycle(&mut self, cycle_id: Uuid) -> Result<CycleReport> {
        self.gate.set_policy(NotifyPolicy::AnyStatus);

        let checked_at = self.clock.now();
        let outcome = self.check().await?;

        let notification = match outcome.classification() {
            None => NotificationOutcome::Skipped,
            Some(classification) => {
                let now = self.clock.now();
                let text = message::status_update(classification, &self.config.target_url, now);
                self.deliver(&text, classification, now).await
            }
        };

        Ok(CycleReport {
            cycle_id,
            checked_at,
            outcome,
            notification,
        })
    }

    /// Run until `shutdown` flips to `true`.
    ///
    /// An initial check must succeed first. After that, fetch failures are
    /// retried on the next interval and any other error restarts the
    /// monitoring loop after the recovery delay, checking straight away.
    pub async fn run_continuous(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<WatchExit> {
        self.transition(MonitorState::Initializing);
        tracing::info!(
            url = %self.config.target_url,
            selector = %self.config.target_selector,
            interval_secs = self.config.check_interval.as_secs(),
            notifications = self.notifications_enabled(),
            "Starting ticket watcher"
        );
        if !self.notifications_enabled() {
            tracing::warn!("LINE_ACCESS_TOKEN is not set; monitoring continues without notifications");
        }

        tracing::info!("Running initial check");
        let first = self.run_cycle().await?;
        if !first.outcome.success() {
            tracing::error!("Initial check failed; verify TICKET_URL and TARGET_CLASS");
            self.transition(MonitorState::Stopped);
            return Ok(WatchExit::InitialCheckFailed);
        }
        tracing::info!("Initial check complete; starting periodic monitoring");

        let mut check_first = false;
        loop {
            match self.monitor_loop(&mut shutdown, check_first).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        recovery_secs = self.config.recovery_delay.as_secs(),
                        "Unexpected error in monitoring loop"
                    );
                    if sleep_or_shutdown(self.config.recovery_delay, &mut shutdown).await {
                        break;
                    }
                    tracing::info!("Resuming monitoring");
                    check_first = true;
                }
            }
        }

        tracing::info!("Stopping ticket watcher");
        self.transition(MonitorState::Stopped);
        Ok(WatchExit::Stopped)
    }

    /// Sleep-then-check until shutdown. A restarted loop checks before its
    /// first sleep.
    async fn monitor_loop(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
        mut check_now: bool,
    ) -> Result<()> {
        loop {
            if !check_now {
                self.transition(MonitorState::Sleeping);
                tracing::debug!(
                    interval_secs = self.config.check_interval.as_secs(),
                    "Waiting for next check"
                );
                if sleep_or_shutdown(self.config.check_interval, shutdown).await {
                    return Ok(());
                }
            }
            check_now = false;

            let report = self.run_cycle().await?;
            if !report.outcome.success() {
                tracing::warn!("Check failed; retrying at the next interval");
            }
        }
    }
}

fn log_classification(classification: &ClassificationResult) {
    tracing::info!(
        total_elements = classification.total_element_count,
        sold_out_count = classification.sold_out_count(),
        "{}",
        classification.summary()
    );
    for (i, text) in classification.all_texts.iter().enumerate() {
        tracing::info!("  {}. {}", i + 1, text);
    }
}

/// Sleep for `duration` unless a shutdown is requested first. Returns `true`
/// when the caller should stop.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown_requested(shutdown) => true,
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender gone: nobody can ask us to stop any more.
            std::future::pending::<()>().await;
        }
    }
}
