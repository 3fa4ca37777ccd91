use super::*;
use std::time::Duration;
use ticket_watcher::monitor::{CheckStatus, NotificationOutcome, TicketMonitor};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sold_out_page_reports_matching_elements() -> anyhow::Result<()> {
    let page = StaticPage::new(SOLD_OUT_HTML);
    let notifier = RecordingNotifier::new();
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(900)),
        page.clone(),
        Some(notifier.clone()),
    );

    let report = monitor.run_single_check().await?;

    assert_eq!(report.check_status(), CheckStatus::SoldOut);
    let classification = report.outcome.classification().expect("classification");
    assert_eq!(classification.total_element_count, 3);
    assert_eq!(classification.sold_out_count(), 2);
    assert_eq!(classification.matching_elements[1].tag_name, "a");
    assert_eq!(classification.matching_elements[1].link.as_deref(), Some("/event/1/b"));
    assert_eq!(classification.all_texts[0], "S席 完売しました");
    assert!(notifier.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_elements_is_a_failed_check() -> anyhow::Result<()> {
    let page = StaticPage::new(MISSING_HTML);
    let notifier = RecordingNotifier::new();
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(900)),
        page.clone(),
        Some(notifier.clone()),
    );

    let report = monitor.run_single_check().await?;

    assert_eq!(report.check_status(), CheckStatus::CheckFailed);
    assert_eq!(report.check_status().exit_code(), 1);
    assert!(report.outcome.message().contains(TARGET_SELECTOR));
    assert!(notifier.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_available_page_broadcasts_through_line() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/broadcast"))
        .and(header("authorization", "Bearer test-channel-token"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-line-request-id", "req-42"))
        .expect(1)
        .mount(&server)
        .await;

    let page = StaticPage::new(AVAILABLE_HTML);
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(900)),
        page.clone(),
        Some(line_notifier(&server.uri())),
    );

    let report = monitor.run_single_check().await?;

    assert_eq!(report.check_status(), CheckStatus::Available);
    assert_eq!(
        report.notification,
        NotificationOutcome::Sent {
            message_id: Some("req-42".to_string())
        }
    );

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    let text = body["messages"][0]["text"].as_str().unwrap_or_default();
    assert!(text.contains("チケット販売開始"));
    assert!(text.contains(TICKET_URL));
    Ok(())
}

#[tokio::test]
async fn test_rejected_broadcast_keeps_available_status() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string(r#"{"message":"monthly limit"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let page = StaticPage::new(AVAILABLE_HTML);
    let mut monitor = TicketMonitor::new(
        test_monitor_config(Duration::from_secs(900)),
        page.clone(),
        Some(line_notifier(&server.uri())),
    );

    let report = monitor.run_single_check().await?;

    assert_eq!(report.check_status(), CheckStatus::Available);
    match report.notification {
        NotificationOutcome::Failed { error } => assert!(error.starts_with("HTTP 429")),
        other => panic!("expected failed delivery, got {:?}", other),
    }
    assert!(monitor.gate().last_notification_time().is_none());
    Ok(())
}
