//! docgate core library
//!
//! Foundational utilities shared by every docgate crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management, including confidence calibration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ConfidenceThresholds, EmbeddingSettings, PipelineSettings};
pub use error::{AppError, AppResult};
