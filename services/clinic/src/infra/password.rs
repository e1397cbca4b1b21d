use anyhow::Context as _;

use crate::domain::repository::PasswordHasher;
use crate::error::ClinicServiceError;

/// bcrypt hashing on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    pub cost: u32,
}

impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, ClinicServiceError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("join bcrypt hash task")?
            .context("hash password")?;
        Ok(hash)
    }

    /// A malformed stored hash counts as a mismatch.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, ClinicServiceError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("join bcrypt verify task")?;
        match matches {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is not bcrypt");
                Ok(false)
            }
        }
    }
}
