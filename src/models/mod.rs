pub mod element;
pub mod check;

// Re-exports for convenience
pub use element::*;
pub use check::*;
