use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Field name → messages, as reported by validation failures.
pub type FieldMessages = BTreeMap<String, Vec<String>>;

/// JSON body shared by every error response.
///
/// `{"kind": "NOT_FOUND", "message": "patient not found"}`, plus `fields` for
/// validation failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMessages>,
}

impl ErrorBody {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldMessages) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, axum::Json(self)).into_response()
    }
}
