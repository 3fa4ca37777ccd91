// Shared fixtures for the integration tests: an in-memory page source that
// runs the real extraction code, and a notifier that records what it sends.

pub mod single_check_tests;
pub mod watch_tests;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticket_watcher::config::{AccessToken, MonitorConfig, NotifierConfig};
use ticket_watcher::models::ElementRecord;
use ticket_watcher::plugins::{LineNotifier, NotificationResult, NotifierPlugin};
use ticket_watcher::scraper::{extract_elements, PageSource};
use ticket_watcher::{AppError, Result};

pub const TICKET_URL: &str = "https://tickets.example.com/event/1";
pub const TARGET_SELECTOR: &str = ".ticket-status";

pub const SOLD_OUT_HTML: &str = r#"
<html><body>
  <div class="ticket-status">S席 <span>完売しました</span></div>
  <div class="ticket-status">A席 残りわずか</div>
  <a class="ticket-status" href="/event/1/b">B席 完売しました</a>
</body></html>
"#;

pub const AVAILABLE_HTML: &str = r#"
<html><body>
  <div class="ticket-status">S席 残りわずか</div>
  <div class="ticket-status">A席 ○</div>
</body></html>
"#;

pub const MISSING_HTML: &str = r#"<html><body><div class="other">loading</div></body></html>"#;

/// Serves whatever HTML is currently loaded, parsed like a rendered page.
pub struct StaticPage {
    html: Mutex<String>,
    fetches: AtomicUsize,
}

impl StaticPage {
    pub fn new(html: &str) -> Arc<Self> {
        Arc::new(Self {
            html: Mutex::new(html.to_string()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set_html(&self, html: &str) {
        *self.html.lock().unwrap() = html.to_string();
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch_elements(&self, _url: &str, selector: &str) -> Result<Vec<ElementRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let html = self.html.lock().unwrap().clone();
        let elements = extract_elements(&html, selector)?;
        if elements.is_empty() {
            return Err(AppError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(elements)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording Notifier"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(NotificationResult::delivered(None))
    }
}

pub fn test_monitor_config(interval: Duration) -> MonitorConfig {
    MonitorConfig {
        target_url: TICKET_URL.to_string(),
        target_selector: TARGET_SELECTOR.to_string(),
        check_interval: interval,
        notification_cooldown: Duration::from_secs(300),
        recovery_delay: Duration::from_secs(30),
        credential: Some(AccessToken::new("test-channel-token")),
    }
}

pub fn line_notifier(api_base: &str) -> Arc<dyn NotifierPlugin> {
    let notifier = LineNotifier::with_config(
        AccessToken::new("test-channel-token"),
        &NotifierConfig {
            api_base: api_base.to_string(),
            request_timeout: Duration::from_secs(5),
        },
    )
    .unwrap();
    Arc::new(notifier)
}
