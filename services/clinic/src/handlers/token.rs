use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::error::ClinicServiceError;
use crate::handlers::invalid_body;
use crate::state::AppState;
use crate::usecase::token::{IssueTokenInput, IssueTokenUseCase};

// ── POST /user-token/ ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueTokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    body: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ClinicServiceError> {
    let Json(body) = body.map_err(|rejection| invalid_body(&rejection))?;
    let usecase = IssueTokenUseCase {
        users: state.user_repo(),
        tokens: state.token_repo(),
        hasher: state.hasher(),
    };
    let key = usecase
        .execute(IssueTokenInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(TokenResponse {
        token: key.to_string(),
    }))
}
