// Notifier plugin implementations
pub mod line;

pub use line::LineNotifier;
