pub mod config;
pub mod formatting;

// Re-exports
pub use config::*;
