pub mod patient;
pub mod reservation;
pub mod token;
pub mod user;

use axum::Json;
use axum::extract::rejection::JsonRejection;

use clinic_domain::permission::Permission;

use crate::domain::guard::Principal;
use crate::error::ClinicServiceError;

/// Key for body errors that belong to no single field.
const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Unwraps a JSON request body, turning a rejection into a `400` with field
/// messages.
///
/// A caller lacking `permission` gets the `403` instead, whatever the body.
pub fn json_body<T>(
    principal: &Principal,
    permission: Permission,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ClinicServiceError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            principal.require(permission)?;
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            Err(invalid_body(&rejection))
        }
    }
}

/// Maps a JSON rejection to a `400`, keyed by the offending field when serde
/// names one.
pub fn invalid_body(rejection: &JsonRejection) -> ClinicServiceError {
    let text = rejection.body_text();
    if let JsonRejection::JsonDataError(_) = rejection {
        // "<prefix>: <path>: <message>", the path being absent for root errors
        let detail = text.split_once(": ").map_or(text.as_str(), |(_, rest)| rest);
        if let Some(field) = missing_field(detail) {
            return ClinicServiceError::field(field, "This field is required.");
        }
        if let Some((path, message)) = detail.split_once(": ") {
            if !path.is_empty() && !path.contains(char::is_whitespace) {
                let field = path.split(['.', '[']).next().unwrap_or(path);
                return ClinicServiceError::field(field, strip_position(message));
            }
        }
    }
    ClinicServiceError::field(NON_FIELD_ERRORS, strip_position(&text))
}

/// The name in serde's "missing field `name`" message.
fn missing_field(detail: &str) -> Option<&str> {
    detail
        .strip_prefix("missing field `")?
        .split_once('`')
        .map(|(field, _)| field)
}

/// Drops the trailing ` at line L column C` serde_json appends.
fn strip_position(message: &str) -> &str {
    message
        .rsplit_once(" at line ")
        .map_or(message, |(message, _)| message)
}
