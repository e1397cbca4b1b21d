use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use clinic_core::serde::double_option;
use clinic_domain::permission::{Permission, Resource};

use crate::domain::guard::Principal;
use crate::domain::types::{User, UserFilter, WriteMode};
use crate::error::ClinicServiceError;
use crate::handlers::json_body;
use crate::state::AppState;
use crate::usecase::user::{
    CreateUserUseCase, DeleteUserUseCase, GetUserUseCase, ListUsersUseCase, UpdateUserUseCase,
    UserInput,
};

// ── Representations ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserListItem {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: i32,
}

impl From<User> for UserListItem {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.id,
        }
    }
}

#[derive(Serialize)]
pub struct UserDetail {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: i32,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl From<User> for UserDetail {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.id,
            address: user.address,
            phone_number: user.phone_number,
        }
    }
}

/// Body for POST, PUT and PATCH. `password` is write-only.
#[derive(Deserialize)]
pub struct UserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone_number: Option<Option<String>>,
}

impl From<UserRequest> for UserInput {
    fn from(body: UserRequest) -> Self {
        Self {
            email: body.email,
            name: body.name,
            password: body.password,
            role_id: body.role,
            address: body.address,
            phone_number: body.phone_number,
        }
    }
}

// ── GET /users/ ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UserListQuery {
    /// Exact role name, e.g. `Doctor`.
    pub role: Option<String>,
    /// Name prefix.
    pub name: Option<String>,
}

pub async fn list_users(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserListItem>>, ClinicServiceError> {
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = usecase
        .execute(
            &principal,
            UserFilter {
                role: query.role,
                name: query.name,
            },
        )
        .await?;
    Ok(Json(users.into_iter().map(UserListItem::from).collect()))
}

// ── POST /users/ ─────────────────────────────────────────────────────────────

pub async fn create_user(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDetail>), ClinicServiceError> {
    let body = json_body(&principal, Permission::add(Resource::User), body)?;
    let usecase = CreateUserUseCase {
        users: state.user_repo(),
        access: state.access_repo(),
        hasher: state.hasher(),
    };
    let user = usecase.execute(&principal, body.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── GET /users/{id}/ ─────────────────────────────────────────────────────────

pub async fn get_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserDetail>, ClinicServiceError> {
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(&principal, id).await?;
    Ok(Json(user.into()))
}

// ── PUT /users/{id}/ ─────────────────────────────────────────────────────────

pub async fn replace_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserDetail>, ClinicServiceError> {
    let body = json_body(&principal, Permission::change(Resource::User), body)?;
    update(state, principal, id, body, WriteMode::Replace).await
}

// ── PATCH /users/{id}/ ───────────────────────────────────────────────────────

pub async fn patch_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserDetail>, ClinicServiceError> {
    let body = json_body(&principal, Permission::change(Resource::User), body)?;
    update(state, principal, id, body, WriteMode::Partial).await
}

async fn update(
    state: AppState,
    principal: Principal,
    id: i32,
    body: UserRequest,
    mode: WriteMode,
) -> Result<Json<UserDetail>, ClinicServiceError> {
    let usecase = UpdateUserUseCase {
        users: state.user_repo(),
        access: state.access_repo(),
        hasher: state.hasher(),
    };
    let user = usecase.execute(&principal, id, body.into(), mode).await?;
    Ok(Json(user.into()))
}

// ── DELETE /users/{id}/ ──────────────────────────────────────────────────────

pub async fn delete_user(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ClinicServiceError> {
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
