//! GavaConnect operations
//!
//! # Architecture
//!
//! - `KraClient` validates input, builds cache keys and maps responses
//! - All sends go through `crate::http::RequestExecutor` (no direct reqwest)
//! - Bearer tokens come from a pluggable `TokenProvider`
//! - Batch helpers fan out concurrently and join

pub mod auth;
pub mod client;
mod mapping;

pub use auth::{StaticTokenProvider, TokenProvider};
pub use client::{CachedResult, KraClient, KraClientBuilder};
