pub mod app;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod gate;
pub mod message;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use classifier::{StatusClassifier, SOLD_OUT_MARKER};
pub use config::AppConfig;
pub use gate::{NotificationGate, NotifyPolicy};
pub use monitor::{CheckStatus, TicketMonitor, WatchExit};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
