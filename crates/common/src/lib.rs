//! Compras Common Library
//!
//! Shared code for the Compras question service including:
//! - Spreadsheet rows and row stores
//! - The context engine (parsing, filtering, prompt assembly, synthesis)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod context;
pub mod errors;
pub mod metrics;
pub mod rows;

// Re-export commonly used types
pub use config::AppConfig;
pub use context::ContextEngine;
pub use errors::{AppError, Result};
pub use rows::{Row, RowStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
