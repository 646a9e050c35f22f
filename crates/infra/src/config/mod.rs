//! Configuration loading
//!
//! This module provides utilities for loading [`ClientConfig`] from
//! environment variables and files.
//!
//! [`ClientConfig`]: kra_connect_domain::ClientConfig

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, search_config_paths};
