//! # KRA Connect Domain
//!
//! Configuration and data models for the KRA GavaConnect client.
//!
//! This crate contains:
//! - [`ClientConfig`] with documented defaults and one-shot validation
//! - Request and result models for every supported operation
//! - Domain constants (endpoints, cache-key prefixes, defaults)
//!
//! ## Architecture
//! - Depends only on `kra-connect-common` (foundation tier) for the error
//!   taxonomy and input validators
//! - No I/O; pure data structures

pub mod config;
pub mod constants;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use types::*;
