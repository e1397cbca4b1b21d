//! Opaque API token keys.

use std::fmt;
use std::str::FromStr;

use rand::RngExt;
use serde::{Deserialize, Serialize};

/// Token key length in characters.
pub const TOKEN_KEY_LEN: usize = 40;

const CHARSET: &[u8] = b"0123456789abcdef";

/// Errors returned when parsing a token key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenKeyError {
    #[error("token key must be {TOKEN_KEY_LEN} characters")]
    Length,
    #[error("token key must be lowercase hex")]
    Charset,
}

/// A 40-character lowercase hex token, stored server-side and sent by clients
/// as `Authorization: Bearer <key>`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenKey(String);

impl TokenKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let key = (0..TOKEN_KEY_LEN)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect();
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TokenKey {
    type Err = TokenKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TOKEN_KEY_LEN {
            return Err(TokenKeyError::Length);
        }
        if !s.bytes().all(|b| CHARSET.contains(&b)) {
            return Err(TokenKeyError::Charset);
        }
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for TokenKey {
    type Error = TokenKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenKey> for String {
    fn from(key: TokenKey) -> Self {
        key.0
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keys are credentials; keep them out of debug logs.
impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenKey({}…)", &self.0[..6])
    }
}
