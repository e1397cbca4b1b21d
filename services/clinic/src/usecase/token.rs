use clinic_auth_types::token::TokenKey;

use crate::domain::guard::Principal;
use crate::domain::repository::{PasswordHasher, TokenRepository, UserRepository};
use crate::domain::types::normalize_email;
use crate::error::ClinicServiceError;

// ── IssueToken ───────────────────────────────────────────────────────────────

pub struct IssueTokenInput {
    pub email: String,
    pub password: String,
}

pub struct IssueTokenUseCase<U: UserRepository, T: TokenRepository, H: PasswordHasher> {
    pub users: U,
    pub tokens: T,
    pub hasher: H,
}

impl<U, T, H> IssueTokenUseCase<U, T, H>
where
    U: UserRepository,
    T: TokenRepository,
    H: PasswordHasher,
{
    /// Returns the caller's token, creating it on first login.
    ///
    /// Unknown email, wrong password and inactive account all fail the same way.
    pub async fn execute(&self, input: IssueTokenInput) -> Result<TokenKey, ClinicServiceError> {
        let email = normalize_email(&input.email);
        let credentials = self
            .users
            .credentials(&email)
            .await?
            .ok_or(ClinicServiceError::InvalidCredentials)?;
        if !credentials.is_active {
            return Err(ClinicServiceError::InvalidCredentials);
        }
        if !self
            .hasher
            .verify(&input.password, &credentials.password_hash)
            .await?
        {
            return Err(ClinicServiceError::InvalidCredentials);
        }
        let key = self
            .tokens
            .get_or_create(credentials.user_id, &TokenKey::generate())
            .await?;
        tracing::info!(user_id = credentials.user_id, "token issued");
        Ok(key)
    }
}

// ── ResolvePrincipal ─────────────────────────────────────────────────────────

pub struct ResolvePrincipalUseCase<T: TokenRepository> {
    pub tokens: T,
}

impl<T: TokenRepository> ResolvePrincipalUseCase<T> {
    pub async fn execute(&self, key: &TokenKey) -> Result<Principal, ClinicServiceError> {
        self.tokens
            .principal(key)
            .await?
            .ok_or(ClinicServiceError::Unauthenticated)
    }
}
