//! Configuration loading
//!
//! This module loads application configuration from environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::load_config;
