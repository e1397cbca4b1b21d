use clinic::domain::types::{INVALID_PHONE_NUMBER, PatientFilter, PatientInput, WriteMode};
use clinic::error::ClinicServiceError;
use clinic::handlers::patient::PatientRequest;
use clinic::usecase::patient::{
    CreatePatientUseCase, DeletePatientUseCase, GetPatientUseCase, ListPatientsUseCase,
    UpdatePatientUseCase,
};
use clinic_domain::role::RoleKind;
use clinic_testing::payload::{patient_detail_payload, patient_payload};

use crate::helpers::{Store, date, nobody, staff};

fn input(payload: serde_json::Value) -> PatientInput {
    let body: PatientRequest = serde_json::from_value(payload).unwrap();
    body.into()
}

#[tokio::test]
async fn should_create_patient_with_exact_payload() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);

    let patient = CreatePatientUseCase {
        patients: store.clone(),
    }
    .execute(&admin, input(patient_detail_payload()))
    .await
    .unwrap();

    assert_eq!(patient.name, "patient name");
    assert_eq!(patient.relative.as_deref(), Some("father"));
    assert_eq!(patient.relative_name.as_deref(), Some("test relative name"));
    assert_eq!(patient.phone_number, "0987654321");
    assert_eq!(patient.birth_date, date(2015, 7, 23));
    assert_eq!(store.patients(), vec![patient]);
}

#[tokio::test]
async fn should_deny_patient_creation_to_doctor() {
    let store = Store::seeded();
    let (_, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);

    let result = CreatePatientUseCase {
        patients: store.clone(),
    }
    .execute(&doctor, input(patient_payload()))
    .await;

    assert!(
        matches!(result, Err(ClinicServiceError::PermissionDenied(ref c)) if c == "add_patient"),
        "expected PermissionDenied(add_patient), got {result:?}"
    );
    assert!(store.patients().is_empty());
}

#[tokio::test]
async fn should_reject_invalid_phone_number_without_persisting() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let mut payload = patient_payload();
    payload["phone_number"] = "12345".into();

    let result = CreatePatientUseCase {
        patients: store.clone(),
    }
    .execute(&receptionist, input(payload))
    .await;

    let Err(ClinicServiceError::Validation(fields)) = result else {
        panic!("expected validation failure");
    };
    assert_eq!(fields["phone_number"], vec![INVALID_PHONE_NUMBER.to_owned()]);
    assert!(store.patients().is_empty());
}

#[tokio::test]
async fn should_check_permission_before_validation() {
    let store = Store::seeded();
    let (_, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);

    let result = CreatePatientUseCase {
        patients: store.clone(),
    }
    .execute(&doctor, PatientInput::default())
    .await;

    assert!(matches!(result, Err(ClinicServiceError::PermissionDenied(_))));
}

#[tokio::test]
async fn should_deny_patient_deletion_to_receptionist() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let patient = store.add_patient("Omar");

    let result = DeletePatientUseCase {
        patients: store.clone(),
    }
    .execute(&receptionist, patient.id)
    .await;

    assert!(matches!(
        result,
        Err(ClinicServiceError::PermissionDenied(ref c)) if c == "delete_patient"
    ));
    assert_eq!(store.patients().len(), 1);
}

#[tokio::test]
async fn should_return_not_found_on_second_patient_delete() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let patient = store.add_patient("Omar");
    let usecase = DeletePatientUseCase {
        patients: store.clone(),
    };

    usecase.execute(&admin, patient.id).await.unwrap();
    let second = usecase.execute(&admin, patient.id).await;

    assert!(matches!(second, Err(ClinicServiceError::PatientNotFound)));
    assert!(store.patients().is_empty());
}

#[tokio::test]
async fn should_check_view_permission_before_lookup() {
    let store = Store::seeded();

    let result = GetPatientUseCase {
        patients: store.clone(),
    }
    .execute(&nobody(), 777)
    .await;

    assert!(matches!(
        result,
        Err(ClinicServiceError::PermissionDenied(ref c)) if c == "view_patient"
    ));
}

#[tokio::test]
async fn should_return_not_found_for_missing_patient() {
    let store = Store::seeded();
    let (_, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);

    let result = GetPatientUseCase {
        patients: store.clone(),
    }
    .execute(&doctor, 777)
    .await;

    assert!(matches!(result, Err(ClinicServiceError::PatientNotFound)));
}

#[tokio::test]
async fn should_patch_only_sent_fields() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let patient = store.add_patient("Omar");

    let updated = UpdatePatientUseCase {
        patients: store.clone(),
    }
    .execute(
        &receptionist,
        patient.id,
        input(serde_json::json!({ "name": "Omar Khaled", "relative": "uncle" })),
        WriteMode::Partial,
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Omar Khaled");
    assert_eq!(updated.relative.as_deref(), Some("uncle"));
    assert_eq!(updated.phone_number, patient.phone_number);
    assert_eq!(updated.birth_date, patient.birth_date);
    assert_eq!(store.patients(), vec![updated]);
}

#[tokio::test]
async fn should_clear_nullable_fields_on_replace() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let create = CreatePatientUseCase {
        patients: store.clone(),
    };
    let patient = create
        .execute(&admin, input(patient_detail_payload()))
        .await
        .unwrap();

    let updated = UpdatePatientUseCase {
        patients: store.clone(),
    }
    .execute(&admin, patient.id, input(patient_payload()), WriteMode::Replace)
    .await
    .unwrap();

    assert_eq!(updated.name, "test name");
    assert_eq!(updated.relative, None);
    assert_eq!(updated.relative_name, None);
}

#[tokio::test]
async fn should_reject_replace_with_missing_fields() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let patient = store.add_patient("Omar");

    let result = UpdatePatientUseCase {
        patients: store.clone(),
    }
    .execute(
        &admin,
        patient.id,
        input(serde_json::json!({ "name": "Omar" })),
        WriteMode::Replace,
    )
    .await;

    let Err(ClinicServiceError::Validation(fields)) = result else {
        panic!("expected validation failure");
    };
    assert!(fields.contains_key("phone_number"));
    assert!(fields.contains_key("birth_date"));
    assert_eq!(store.patients(), vec![patient]);
}

#[tokio::test]
async fn should_filter_patients_by_name_prefix() {
    let store = Store::seeded();
    let (_, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);
    store.add_patient("Mona Adel");
    store.add_patient("Omar Khaled");
    store.add_patient("Mohamed Ali");

    let patients = ListPatientsUseCase {
        patients: store.clone(),
    }
    .execute(
        &doctor,
        PatientFilter {
            name: Some("Mo".into()),
        },
    )
    .await
    .unwrap();

    let names: Vec<_> = patients.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Mona Adel", "Mohamed Ali"]);
}

#[tokio::test]
async fn should_report_not_found_when_patient_vanishes_before_update() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let patient = store.add_patient("Omar");
    store.data.lock().unwrap().delete_before_update = true;

    let result = UpdatePatientUseCase {
        patients: store.clone(),
    }
    .execute(
        &admin,
        patient.id,
        input(serde_json::json!({ "name": "Omar Khaled" })),
        WriteMode::Partial,
    )
    .await;

    assert!(matches!(result, Err(ClinicServiceError::PatientNotFound)));
}
