use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::utils::error::{AppError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";

/// Flat settings as read from the environment, `.env` and an optional file.
///
/// Keys match the upper-cased environment names (`TICKET_URL` becomes
/// `ticket_url`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(url(message = "TICKET_URL must be an absolute URL"))]
    pub ticket_url: String,
    #[validate(length(min = 1, message = "TARGET_CLASS must not be empty"))]
    pub target_class: String,
    pub line_access_token: Option<String>,
    #[validate(url(message = "LINE_API_BASE must be an absolute URL"))]
    pub line_api_base: String,

    #[validate(range(min = 1, message = "CHECK_INTERVAL_SECS must be at least 1"))]
    pub check_interval_secs: u64,
    pub notification_cooldown_secs: u64,
    pub recovery_delay_secs: u64,
    #[validate(range(min = 1, message = "REQUEST_TIMEOUT_SECS must be at least 1"))]
    pub request_timeout_secs: u64,

    pub settle_delay_ms: u64,
    #[validate(range(min = 1, message = "NAVIGATION_TIMEOUT_SECS must be at least 1"))]
    pub navigation_timeout_secs: u64,
    pub user_agent: String,
    pub chrome_path: Option<String>,
}

/// What the run controller needs. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub target_url: String,
    pub target_selector: String,
    pub check_interval: Duration,
    pub notification_cooldown: Duration,
    pub recovery_delay: Duration,
    pub credential: Option<AccessToken>,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub chrome_path: Option<String>,
    pub settle_delay: Duration,
    pub navigation_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub api_base: String,
    pub request_timeout: Duration,
}

/// Broadcast channel access token. Its value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl AppConfig {
    /// Load `.env`, then layer defaults, the optional file and the process
    /// environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        Self::from_sources(config_file, None)
    }

    /// Same as [`AppConfig::load`] without `.env`, reading environment
    /// variables from `env` instead of the process when given.
    pub fn from_sources(
        config_file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("line_api_base", DEFAULT_LINE_API_BASE)?
            .set_default("check_interval_secs", 15 * 60)?
            .set_default("notification_cooldown_secs", 300)?
            .set_default("recovery_delay_secs", 30)?
            .set_default("request_timeout_secs", 10)?
            .set_default("settle_delay_ms", 3000)?
            .set_default("navigation_timeout_secs", 30)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }

        let config: AppConfig = builder
            .add_source(Environment::default().source(env))
            .build()?
            .try_deserialize()?;

        config.check()?;
        Ok(config)
    }

    /// Field validation, an http(s) scheme check and a parse of the derived
    /// CSS selector.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        let ticket_url = url::Url::parse(&self.ticket_url)
            .map_err(|e| AppError::Validation(format!("TICKET_URL is not a valid URL: {}", e)))?;
        if !matches!(ticket_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "TICKET_URL must use http or https, got '{}'",
                ticket_url.scheme()
            )));
        }

        let selector = self.target_selector();
        scraper::Selector::parse(&selector).map_err(|e| {
            AppError::Validation(format!(
                "TARGET_CLASS does not form a valid selector '{}': {:?}",
                selector, e
            ))
        })?;

        Ok(())
    }

    /// `TARGET_CLASS` names a CSS class; a leading `.` is accepted too.
    pub fn target_selector(&self) -> String {
        let class = self.target_class.trim();
        if class.starts_with('.') {
            class.to_string()
        } else {
            format!(".{}", class)
        }
    }

    /// An empty token counts as missing.
    pub fn credential(&self) -> Option<AccessToken> {
        self.line_access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            target_url: self.ticket_url.clone(),
            target_selector: self.target_selector(),
            check_interval: Duration::from_secs(self.check_interval_secs),
            notification_cooldown: Duration::from_secs(self.notification_cooldown_secs),
            recovery_delay: Duration::from_secs(self.recovery_delay_secs),
            credential: self.credential(),
        }
    }

    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            user_agent: self.user_agent.clone(),
            chrome_path: self.chrome_path.clone().filter(|p| !p.is_empty()),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
        }
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig {
            api_base: self.line_api_base.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
