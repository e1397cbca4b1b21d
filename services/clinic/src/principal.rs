//! Resolves the calling staff member from the `Authorization` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use clinic_auth_types::identity::BearerToken;

use crate::domain::guard::Principal;
use crate::error::ClinicServiceError;
use crate::state::AppState;
use crate::usecase::token::ResolvePrincipalUseCase;

/// 401 when the header is missing or malformed, or when the token does not
/// belong to an active user.
impl FromRequestParts<AppState> for Principal {
    type Rejection = ClinicServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(key) = BearerToken::from_headers(&parts.headers).map_err(|e| {
            tracing::debug!(error = %e, "rejected authorization header");
            ClinicServiceError::Unauthenticated
        })?;
        let usecase = ResolvePrincipalUseCase {
            tokens: state.token_repo(),
        };
        usecase.execute(&key).await
    }
}
