pub mod traits;
pub mod notifiers;

pub use notifiers::LineNotifier;
pub use traits::{NotifierPlugin, NotificationResult};
