use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use clinic_core::health::{database_ready, healthz};
use clinic_core::middleware::{X_REQUEST_ID, propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    patient::{
        create_patient, delete_patient, get_patient, import_patients, list_patients,
        patch_patient, replace_patient,
    },
    reservation::{
        create_reservation, delete_reservation, get_reservation, list_reservations,
        patch_reservation, replace_reservation,
    },
    token::issue_token,
    user::{create_user, delete_user, get_user, list_users, patch_user, replace_user},
};
use crate::state::AppState;

/// Upper bound for spreadsheet uploads.
const IMPORT_BODY_LIMIT: usize = 10 * 1024 * 1024;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    database_ready(&state.db).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Token
        .route("/user-token/", post(issue_token))
        // Users
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/{id}/",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        // Patients
        .route("/patients/", get(list_patients).post(create_patient))
        .route(
            "/patients/import_patient/",
            post(import_patients).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route(
            "/patients/{id}/",
            get(get_patient)
                .put(replace_patient)
                .patch(patch_patient)
                .delete(delete_patient),
        )
        // Reservations
        .route("/", get(list_reservations).post(create_reservation))
        .route(
            "/{id}/",
            get(get_reservation)
                .put(replace_reservation)
                .patch(patch_reservation)
                .delete(delete_reservation),
        )
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(request_id_layer())
        .with_state(state)
}
