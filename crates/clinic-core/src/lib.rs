//! HTTP and runtime plumbing shared by the clinic service and its tools.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
