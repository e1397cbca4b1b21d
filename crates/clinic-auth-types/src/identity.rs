//! `Authorization` header parsing.

use http::{HeaderMap, header::AUTHORIZATION};

use crate::token::TokenKey;

/// Accepted authorization schemes. `Token` is kept for older clients.
const SCHEMES: [&str; 2] = ["Bearer", "Token"];

/// Why a request carries no usable credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthHeaderError {
    #[error("authorization header missing")]
    Missing,
    #[error("unsupported authorization scheme")]
    Scheme,
    #[error("malformed token")]
    Malformed,
}

/// The token key presented by the caller.
///
/// Only the header shape is checked here. Whether the key belongs to an
/// active user is decided by the service.
#[derive(Debug, Clone)]
pub struct BearerToken(pub TokenKey);

impl BearerToken {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthHeaderError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthHeaderError::Missing)?
            .to_str()
            .map_err(|_| AuthHeaderError::Malformed)?;
        let (scheme, key) = value
            .trim()
            .split_once(' ')
            .ok_or(AuthHeaderError::Malformed)?;
        if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
            return Err(AuthHeaderError::Scheme);
        }
        let key = key
            .trim()
            .parse::<TokenKey>()
            .map_err(|_| AuthHeaderError::Malformed)?;
        Ok(Self(key))
    }
}
