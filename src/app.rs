//! Subcommand entry points. Each returns the process exit code.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::AppConfig;
use crate::message;
use crate::monitor::{exit_codes, CycleReport, TicketMonitor};
use crate::plugins::{LineNotifier, NotifierPlugin};
use crate::scraper::WebScraper;
use crate::utils::error::Result;

/// `None` when no access token is configured.
pub fn build_notifier(config: &AppConfig) -> Result<Option<Arc<dyn NotifierPlugin>>> {
    match config.credential() {
        Some(token) => {
            let notifier = LineNotifier::with_config(token, &config.notifier_config())?;
            Ok(Some(Arc::new(notifier)))
        }
        None => Ok(None),
    }
}

pub fn build_monitor(config: &AppConfig) -> Result<TicketMonitor> {
    let source = Arc::new(WebScraper::new(config.scraper_config()));
    let notifier = build_notifier(config)?;
    Ok(TicketMonitor::new(config.monitor_config(), source, notifier))
}

pub async fn run_check(config_file: Option<&Path>, json: bool) -> i32 {
    let config = match AppConfig::load(config_file) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return exit_codes::CONFIGURATION_ERROR;
        }
    };

    let mut monitor = match build_monitor(&config) {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!("Failed to start ticket check: {}", e);
            return exit_codes::UNEXPECTED_ERROR;
        }
    };

    report_check(monitor.run_single_check().await, json)
}

/// Map a one-shot result to its exit code, printing the outcome as JSON when
/// asked.
pub fn report_check(result: Result<CycleReport>, json: bool) -> i32 {
    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_configuration_error() => {
            tracing::error!("Configuration error: {}", e);
            return exit_codes::CONFIGURATION_ERROR;
        }
        Err(e) => {
            tracing::error!("Unexpected error during ticket check: {}", e);
            return exit_codes::UNEXPECTED_ERROR;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report.outcome) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                tracing::error!("Failed to serialize check outcome: {}", e);
                return exit_codes::UNEXPECTED_ERROR;
            }
        }
    }

    report.check_status().exit_code()
}

pub async fn run_watch(config_file: Option<&Path>, interval: Option<u64>) -> i32 {
    let mut config = match AppConfig::load(config_file) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return exit_codes::WATCH_FAILED;
        }
    };

    if let Some(secs) = interval {
        config.check_interval_secs = secs;
        if let Err(e) = config.check() {
            tracing::error!("Configuration error: {}", e);
            return exit_codes::WATCH_FAILED;
        }
    }

    let mut monitor = match build_monitor(&config) {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!("Failed to start ticket watcher: {}", e);
            return exit_codes::WATCH_FAILED;
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    match monitor.run_continuous(shutdown_rx).await {
        Ok(exit) => exit.exit_code(),
        Err(e) => {
            tracing::error!("Ticket watcher failed to start: {}", e);
            exit_codes::WATCH_FAILED
        }
    }
}

/// Send one broadcast to confirm the credential works: 0 delivered,
/// 1 not delivered, 2 configuration error.
pub async fn run_test_notify(config_file: Option<&Path>, text: Option<String>) -> i32 {
    let config = match AppConfig::load(config_file) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return exit_codes::CONFIGURATION_ERROR;
        }
    };

    let notifier = match build_notifier(&config) {
        Ok(Some(notifier)) => notifier,
        Ok(None) => {
            tracing::error!("LINE_ACCESS_TOKEN is not set; nothing to test");
            return exit_codes::CONFIGURATION_ERROR;
        }
        Err(e) => {
            tracing::error!("Failed to build notifier: {}", e);
            return exit_codes::UNEXPECTED_ERROR;
        }
    };

    let text = text.unwrap_or_else(|| message::TEST_MESSAGE.to_string());
    send_test_message(notifier.as_ref(), &text).await
}

pub async fn send_test_message(notifier: &dyn NotifierPlugin, text: &str) -> i32 {
    match notifier.notify(text).await {
        Ok(result) if result.success => {
            tracing::info!(message_id = ?result.message_id, "Test message sent");
            0
        }
        Ok(result) => {
            tracing::error!(error = ?result.error, "Test message rejected");
            1
        }
        Err(e) => {
            tracing::error!("Test message could not be sent: {}", e);
            1
        }
    }
}
