use axum::{
    Json,
    extract::{Multipart, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinic_core::error::FieldMessages;
use clinic_core::serde::double_option;
use clinic_domain::permission::{Permission, Resource};

use crate::domain::guard::Principal;
use crate::domain::types::{
    ImportReport, Patient, PatientFilter, PatientInput, RowOutcome, WriteMode,
};
use crate::error::ClinicServiceError;
use crate::handlers::json_body;
use crate::state::AppState;
use crate::usecase::import::ImportPatientsUseCase;
use crate::usecase::patient::{
    CreatePatientUseCase, DeletePatientUseCase, GetPatientUseCase, ListPatientsUseCase,
    UpdatePatientUseCase,
};

/// Multipart field carrying the workbook.
const FILE_FIELD: &str = "file";

// ── Representations ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PatientListItem {
    pub id: i32,
    pub name: String,
    pub birth_date: NaiveDate,
}

impl From<Patient> for PatientListItem {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            birth_date: patient.birth_date,
        }
    }
}

#[derive(Serialize)]
pub struct PatientDetail {
    pub id: i32,
    pub name: String,
    pub relative: Option<String>,
    pub relative_name: Option<String>,
    pub phone_number: String,
    pub birth_date: NaiveDate,
}

impl From<Patient> for PatientDetail {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            relative: patient.relative,
            relative_name: patient.relative_name,
            phone_number: patient.phone_number,
            birth_date: patient.birth_date,
        }
    }
}

#[derive(Deserialize)]
pub struct PatientRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub relative: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub relative_name: Option<Option<String>>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl From<PatientRequest> for PatientInput {
    fn from(body: PatientRequest) -> Self {
        Self {
            name: body.name,
            relative: body.relative,
            relative_name: body.relative_name,
            phone_number: body.phone_number,
            birth_date: body.birth_date,
        }
    }
}

// ── GET /patients/ ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PatientListQuery {
    /// Name prefix.
    pub name: Option<String>,
}

pub async fn list_patients(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Vec<PatientListItem>>, ClinicServiceError> {
    let usecase = ListPatientsUseCase {
        patients: state.patient_repo(),
    };
    let patients = usecase
        .execute(&principal, PatientFilter { name: query.name })
        .await?;
    Ok(Json(patients.into_iter().map(PatientListItem::from).collect()))
}

// ── POST /patients/ ──────────────────────────────────────────────────────────

pub async fn create_patient(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientDetail>), ClinicServiceError> {
    let body = json_body(&principal, Permission::add(Resource::Patient), body)?;
    let usecase = CreatePatientUseCase {
        patients: state.patient_repo(),
    };
    let patient = usecase.execute(&principal, body.into()).await?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

// ── GET /patients/{id}/ ──────────────────────────────────────────────────────

pub async fn get_patient(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PatientDetail>, ClinicServiceError> {
    let usecase = GetPatientUseCase {
        patients: state.patient_repo(),
    };
    let patient = usecase.execute(&principal, id).await?;
    Ok(Json(patient.into()))
}

// ── PUT /patients/{id}/ ──────────────────────────────────────────────────────

pub async fn replace_patient(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<Json<PatientDetail>, ClinicServiceError> {
    let body = json_body(&principal, Permission::change(Resource::Patient), body)?;
    update(state, principal, id, body, WriteMode::Replace).await
}

// ── PATCH /patients/{id}/ ────────────────────────────────────────────────────

pub async fn patch_patient(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<Json<PatientDetail>, ClinicServiceError> {
    let body = json_body(&principal, Permission::change(Resource::Patient), body)?;
    update(state, principal, id, body, WriteMode::Partial).await
}

async fn update(
    state: AppState,
    principal: Principal,
    id: i32,
    body: PatientRequest,
    mode: WriteMode,
) -> Result<Json<PatientDetail>, ClinicServiceError> {
    let usecase = UpdatePatientUseCase {
        patients: state.patient_repo(),
    };
    let patient = usecase.execute(&principal, id, body.into(), mode).await?;
    Ok(Json(patient.into()))
}

// ── DELETE /patients/{id}/ ───────────────────────────────────────────────────

pub async fn delete_patient(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ClinicServiceError> {
    let usecase = DeletePatientUseCase {
        patients: state.patient_repo(),
    };
    usecase.execute(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /patients/import_patient/ ───────────────────────────────────────────

#[derive(Serialize)]
pub struct ImportResponse {
    pub created: u64,
    pub rows: Vec<RowResponse>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowResponse {
    Created { line: usize, name: String },
    Skipped { line: usize, name: String },
    Rejected { line: usize, errors: FieldMessages },
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        let rows = report
            .rows
            .into_iter()
            .map(|row| match row {
                RowOutcome::Created { line, name } => RowResponse::Created { line, name },
                RowOutcome::Skipped { line, name } => RowResponse::Skipped { line, name },
                RowOutcome::Rejected { line, errors } => RowResponse::Rejected { line, errors },
            })
            .collect();
        Self {
            created: report.created,
            rows,
        }
    }
}

pub async fn import_patients(
    principal: Principal,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ClinicServiceError> {
    principal.require(Permission::add(Resource::Patient))?;
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ClinicServiceError::InvalidImport(e.to_string()))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ClinicServiceError::InvalidImport(e.to_string()))?;
            file = Some(bytes);
        }
    }

    let usecase = ImportPatientsUseCase {
        patients: state.patient_repo(),
        reader: state.spreadsheet_reader(),
    };
    let report = usecase.execute(&principal, file.as_deref()).await?;
    Ok(Json(report.into()))
}
