use super::*;
use std::time::Duration;
use tokio::sync::watch;
use ticket_watcher::monitor::{MonitorState, NotificationOutcome, TicketMonitor, WatchExit};

#[tokio::test(start_paused = true)]
async fn test_watch_stops_on_interrupt() -> anyhow::Result<()> {
    let page = StaticPage::new(SOLD_OUT_HTML);
    let notifier = RecordingNotifier::new();
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(60)),
        page.clone(),
        Some(notifier.clone()),
    );

    let (tx, rx) = watch::channel(false);
    let stopper = tokio::spawn(async move {
        // Between the third and fourth check
        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).ok();
    });

    let exit = monitor.run_continuous(rx).await?;
    stopper.await?;

    assert_eq!(exit, WatchExit::Stopped);
    assert_eq!(exit.exit_code(), 0);
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(page.fetches(), 3);

    // Sold out is still reported while watching, once per cooldown window
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("チケット完売中"));
    assert!(messages[0].contains("完売要素数: 2"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_watch_exits_when_initial_check_fails() -> anyhow::Result<()> {
    let page = StaticPage::new(MISSING_HTML);
    let notifier = RecordingNotifier::new();
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(60)),
        page.clone(),
        Some(notifier.clone()),
    );

    let (_tx, rx) = watch::channel(false);
    let exit = monitor.run_continuous(rx).await?;

    assert_eq!(exit, WatchExit::InitialCheckFailed);
    assert_eq!(exit.exit_code(), 1);
    assert_eq!(page.fetches(), 1);
    assert!(notifier.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cycle_survives_page_changes() -> anyhow::Result<()> {
    let page = StaticPage::new(SOLD_OUT_HTML);
    let notifier = RecordingNotifier::new();
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(60)),
        page.clone(),
        Some(notifier.clone()),
    );

    let first = monitor.run_cycle().await?;
    assert!(first.outcome.is_sold_out());
    assert!(first.notification.was_sent());

    page.set_html(MISSING_HTML);
    let second = monitor.run_cycle().await?;
    assert!(!second.outcome.success());
    assert_eq!(second.notification, NotificationOutcome::Skipped);

    page.set_html(AVAILABLE_HTML);
    let third = monitor.run_cycle().await?;
    assert!(!third.outcome.is_sold_out());
    // Still inside the five minute cooldown
    assert!(matches!(third.notification, NotificationOutcome::Suppressed { .. }));
    assert_eq!(notifier.messages().len(), 1);
    Ok(())
}
