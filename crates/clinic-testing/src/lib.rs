//! Test utilities for the clinic service.
//!
//! Provides authorization headers for a token key and canned request payloads.
//! Import from dev-dependencies only, never in production code.

pub mod auth;
pub mod payload;
