use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{ElementRef, Html, Node, Selector};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ScraperConfig;
use crate::models::ElementRecord;
use crate::utils::error::{AppError, Result};

/// Anything that can hand back the elements matching a selector on a page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Elements in document order. Fails when the page cannot be loaded or
    /// nothing matches the selector.
    async fn fetch_elements(&self, url: &str, selector: &str) -> Result<Vec<ElementRecord>>;
}

/// Renders the page in headless Chrome and extracts matching elements.
///
/// Each fetch launches its own browser; the tab and the browser process are
/// released when the fetch returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct WebScraper {
    config: ScraperConfig,
}

/// Closes the tab when dropped.
struct TabGuard(Arc<Tab>);

impl Deref for TabGuard {
    type Target = Tab;

    fn deref(&self) -> &Tab {
        &self.0
    }
}

impl Drop for TabGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close(true) {
            tracing::debug!("Failed to close tab: {}", e);
        }
    }
}

impl WebScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn launch_browser(config: &ScraperConfig) -> Result<Browser> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                std::ffi::OsStr::new("--no-sandbox"),
                std::ffi::OsStr::new("--disable-dev-shm-usage"),
                std::ffi::OsStr::new("--disable-gpu"),
                std::ffi::OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Scraping(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        Browser::new(launch_options)
            .map_err(|e| AppError::Scraping(format!("Failed to launch browser: {}", e)))
    }

    /// Blocking part of a fetch; runs on the blocking pool.
    fn render_page(config: &ScraperConfig, url: &str) -> Result<String> {
        let browser = Self::launch_browser(config)?;

        let tab = TabGuard(
            browser
                .new_tab()
                .map_err(|e| AppError::Scraping(format!("Failed to create tab: {}", e)))?,
        );
        tab.set_default_timeout(config.navigation_timeout);

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| AppError::Scraping(format!("Failed to set user agent: {}", e)))?;

        tab.navigate_to(url)
            .map_err(|e| AppError::Scraping(format!("Navigation failed: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| AppError::Scraping(format!("Page load failed: {}", e)))?;

        // Client-side rendering keeps filling in after the load event.
        std::thread::sleep(config.settle_delay);

        tab.get_content()
            .map_err(|e| AppError::Scraping(format!("Failed to get page content: {}", e)))
    }
}

#[async_trait]
impl PageSource for WebScraper {
    async fn fetch_elements(&self, url: &str, selector: &str) -> Result<Vec<ElementRecord>> {
        let start_time = Instant::now();
        tracing::info!(url, "Accessing page");

        let config = self.config.clone();
        let target = url.to_string();
        let html = tokio::task::spawn_blocking(move || Self::render_page(&config, &target)).await??;

        let elements = extract_elements(&html, selector)?;
        tracing::debug!(
            count = elements.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Page rendered"
        );

        if elements.is_empty() {
            return Err(AppError::ElementNotFound {
                selector: selector.to_string(),
            });
        }

        Ok(elements)
    }
}

/// Pull every element matching `selector` out of an HTML document.
pub fn extract_elements(html: &str, selector: &str) -> Result<Vec<ElementRecord>> {
    let document = Html::parse_document(html);
    let css_selector = Selector::parse(selector).map_err(|e| AppError::Parse {
        message: format!("Invalid CSS selector '{}': {:?}", selector, e),
    })?;

    Ok(document.select(&css_selector).map(to_record).collect())
}

fn to_record(element: ElementRef<'_>) -> ElementRecord {
    let tag_name = element.value().name().to_lowercase();
    let mut raw_text = String::new();
    collect_rendered_text(element, &mut raw_text);
    let text = raw_text.split_whitespace().collect::<Vec<_>>().join(" ");

    let link = if tag_name == "a" {
        element.value().attr("href").map(str::to_string)
    } else {
        None
    };

    ElementRecord {
        tag_name,
        text,
        link,
        raw_markup: element.inner_html(),
    }
}

/// Text a reader would see: skips non-rendered elements and hidden subtrees.
fn collect_rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if is_rendered(child) {
                        collect_rendered_text(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_rendered(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if matches!(value.name(), "script" | "style" | "template" | "noscript") {
        return false;
    }
    if value.attr("hidden").is_some() {
        return false;
    }

    let style = value
        .attr("style")
        .map(|s| s.to_ascii_lowercase().replace(' ', ""))
        .unwrap_or_default();
    !style.contains("display:none") && !style.contains("visibility:hidden")
}
