use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use clinic_core::serde::double_option;
use clinic_domain::permission::{Permission, Resource};

use crate::domain::guard::Principal;
use crate::domain::types::{Reservation, ReservationInput, WriteMode};
use crate::error::ClinicServiceError;
use crate::handlers::json_body;
use crate::state::AppState;
use crate::usecase::reservation::{
    CreateReservationUseCase, DeleteReservationUseCase, GetReservationUseCase,
    ListReservationsInput, ListReservationsUseCase, UpdateReservationUseCase,
};

// ── Representations ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ReservationListItem {
    pub id: i32,
    pub patient: i32,
    pub doctor: i32,
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl From<Reservation> for ReservationListItem {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id,
            patient: reservation.patient_id,
            doctor: reservation.doctor_id,
            description: reservation.description,
            date: reservation.date,
            time: reservation.time,
        }
    }
}

#[derive(Serialize)]
pub struct ReservationDetail {
    pub id: i32,
    pub patient: i32,
    pub doctor: i32,
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub requirements: Option<String>,
    pub patient_reminder: Option<NaiveTime>,
    pub doctor_reminder: Option<NaiveTime>,
}

impl From<Reservation> for ReservationDetail {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id,
            patient: reservation.patient_id,
            doctor: reservation.doctor_id,
            description: reservation.description,
            date: reservation.date,
            time: reservation.time,
            requirements: reservation.requirements,
            patient_reminder: reservation.patient_reminder,
            doctor_reminder: reservation.doctor_reminder,
        }
    }
}

#[derive(Deserialize)]
pub struct ReservationRequest {
    pub patient: Option<i32>,
    pub doctor: Option<i32>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub patient_reminder: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub doctor_reminder: Option<Option<NaiveTime>>,
}

impl From<ReservationRequest> for ReservationInput {
    fn from(body: ReservationRequest) -> Self {
        Self {
            patient_id: body.patient,
            doctor_id: body.doctor,
            date: body.date,
            time: body.time,
            description: body.description,
            requirements: body.requirements,
            patient_reminder: body.patient_reminder,
            doctor_reminder: body.doctor_reminder,
        }
    }
}

// ── GET / ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReservationListQuery {
    /// Defaults to today in the server's local time zone.
    pub date: Option<NaiveDate>,
    pub doctor: Option<i32>,
}

pub async fn list_reservations(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<ReservationListQuery>,
) -> Result<Json<Vec<ReservationListItem>>, ClinicServiceError> {
    let usecase = ListReservationsUseCase {
        reservations: state.reservation_repo(),
    };
    let reservations = usecase
        .execute(
            &principal,
            ListReservationsInput {
                date: query.date,
                doctor_id: query.doctor,
                today: Local::now().date_naive(),
            },
        )
        .await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationListItem::from)
            .collect(),
    ))
}

// ── POST / ───────────────────────────────────────────────────────────────────

pub async fn create_reservation(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationDetail>), ClinicServiceError> {
    let body = json_body(&principal, Permission::add(Resource::Reservation), body)?;
    let usecase = CreateReservationUseCase {
        reservations: state.reservation_repo(),
        patients: state.patient_repo(),
        users: state.user_repo(),
    };
    let reservation = usecase.execute(&principal, body.into()).await?;
    Ok((StatusCode::CREATED, Json(reservation.into())))
}

// ── GET /{id}/ ───────────────────────────────────────────────────────────────

pub async fn get_reservation(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReservationDetail>, ClinicServiceError> {
    let usecase = GetReservationUseCase {
        reservations: state.reservation_repo(),
    };
    let reservation = usecase.execute(&principal, id).await?;
    Ok(Json(reservation.into()))
}

// ── PUT /{id}/ ───────────────────────────────────────────────────────────────

pub async fn replace_reservation(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<Json<ReservationDetail>, ClinicServiceError> {
    let body = json_body(&principal, Permission::change(Resource::Reservation), body)?;
    update(state, principal, id, body, WriteMode::Replace).await
}

// ── PATCH /{id}/ ─────────────────────────────────────────────────────────────

pub async fn patch_reservation(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<Json<ReservationDetail>, ClinicServiceError> {
    let body = json_body(&principal, Permission::change(Resource::Reservation), body)?;
    update(state, principal, id, body, WriteMode::Partial).await
}

async fn update(
    state: AppState,
    principal: Principal,
    id: i32,
    body: ReservationRequest,
    mode: WriteMode,
) -> Result<Json<ReservationDetail>, ClinicServiceError> {
    let usecase = UpdateReservationUseCase {
        reservations: state.reservation_repo(),
        patients: state.patient_repo(),
        users: state.user_repo(),
    };
    let reservation = usecase.execute(&principal, id, body.into(), mode).await?;
    Ok(Json(reservation.into()))
}

// ── DELETE /{id}/ ────────────────────────────────────────────────────────────

pub async fn delete_reservation(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ClinicServiceError> {
    let usecase = DeleteReservationUseCase {
        reservations: state.reservation_repo(),
    };
    usecase.execute(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
