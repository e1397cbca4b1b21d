use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use clinic_core::error::{ErrorBody, FieldMessages};

/// Clinic service error variants.
#[derive(Debug, thiserror::Error)]
pub enum ClinicServiceError {
    #[error("authentication credentials were not provided or are invalid")]
    Unauthenticated,
    #[error("missing permission {0}")]
    PermissionDenied(String),
    #[error("validation failed")]
    Validation(FieldMessages),
    #[error("unable to log in with provided credentials")]
    InvalidCredentials,
    #[error("invalid import file: {0}")]
    InvalidImport(String),
    #[error("user not found")]
    UserNotFound,
    #[error("patient not found")]
    PatientNotFound,
    #[error("reservation not found")]
    ReservationNotFound,
    #[error("no permissions registered for resource {resource}")]
    MissingPermissions { resource: String },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ClinicServiceError {
    /// Validation failure on a single field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldMessages::new();
        fields.insert(name.to_owned(), vec![message.into()]);
        Self::Validation(fields)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidImport(_) => "INVALID_IMPORT",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::PatientNotFound => "PATIENT_NOT_FOUND",
            Self::ReservationNotFound => "RESERVATION_NOT_FOUND",
            Self::MissingPermissions { .. } => "MISSING_PERMISSIONS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::InvalidCredentials | Self::InvalidImport(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UserNotFound | Self::PatientNotFound | Self::ReservationNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::MissingPermissions { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ClinicServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, kind = "INTERNAL", "internal error"),
            Self::MissingPermissions { resource } => {
                tracing::error!(%resource, kind = "MISSING_PERMISSIONS", "permission rows missing")
            }
            _ => {}
        }
        let body = ErrorBody::new(self.kind(), self.to_string());
        let body = match self {
            Self::Validation(fields) => body.with_fields(fields),
            _ => body,
        };
        body.into_response_with(status)
    }
}
