//! Auth types shared across clinic crates.
//!
//! Provides the opaque token key type and `Authorization` header parsing.

pub mod identity;
pub mod token;
