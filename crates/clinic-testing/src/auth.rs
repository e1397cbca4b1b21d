//! Authorization helpers for integration tests.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use clinic_auth_types::token::TokenKey;

/// A caller identified by a token key.
pub struct TestAuth {
    pub key: TokenKey,
}

impl TestAuth {
    pub fn new(key: TokenKey) -> Self {
        Self { key }
    }

    /// A random key that no user owns.
    pub fn unknown() -> Self {
        Self::new(TokenKey::generate())
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", self.key)).unwrap()
    }

    /// Headers as a client would send them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, self.header_value());
        map
    }
}
