use clinic::domain::types::{BLANK, ReservationInput, WriteMode, missing_pk};
use clinic::error::ClinicServiceError;
use clinic::handlers::reservation::ReservationRequest;
use clinic::usecase::reservation::{
    CreateReservationUseCase, DeleteReservationUseCase, GetReservationUseCase,
    ListReservationsInput, ListReservationsUseCase, NOT_A_DOCTOR, UpdateReservationUseCase,
};
use clinic_domain::role::RoleKind;
use clinic_testing::payload::reservation_payload;

use crate::helpers::{Store, date, staff, time};

fn input(payload: serde_json::Value) -> ReservationInput {
    let body: ReservationRequest = serde_json::from_value(payload).unwrap();
    body.into()
}

fn create_usecase(store: &Store) -> CreateReservationUseCase<Store, Store, Store> {
    CreateReservationUseCase {
        reservations: store.clone(),
        patients: store.clone(),
        users: store.clone(),
    }
}

#[tokio::test]
async fn should_create_reservation_for_doctor() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");

    let reservation = create_usecase(&store)
        .execute(&receptionist, input(reservation_payload(patient.id, doctor.id)))
        .await
        .unwrap();

    assert_eq!(reservation.patient_id, patient.id);
    assert_eq!(reservation.doctor_id, doctor.id);
    assert_eq!(reservation.date, date(2024, 7, 23));
    assert_eq!(reservation.time, time(15, 0));
    assert_eq!(reservation.doctor_reminder, Some(time(14, 30)));
    assert_eq!(store.reservations(), vec![reservation]);
}

#[tokio::test]
async fn should_reject_reservation_with_non_doctor() {
    let store = Store::seeded();
    let (receptionist_user, receptionist) =
        staff(&store, "desk@example.com", RoleKind::Receptionist);
    let patient = store.add_patient("Omar");

    let result = create_usecase(&store)
        .execute(
            &receptionist,
            input(reservation_payload(patient.id, receptionist_user.id)),
        )
        .await;

    let Err(ClinicServiceError::Validation(fields)) = result else {
        panic!("expected validation failure");
    };
    assert_eq!(fields["doctor"], vec![NOT_A_DOCTOR.to_owned()]);
    assert!(store.reservations().is_empty());
}

#[tokio::test]
async fn should_reject_unknown_patient_and_blank_description() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let mut payload = reservation_payload(4040, doctor.id);
    payload["description"] = " ".into();

    let result = create_usecase(&store).execute(&admin, input(payload)).await;

    let Err(ClinicServiceError::Validation(fields)) = result else {
        panic!("expected validation failure");
    };
    assert_eq!(fields["patient"], vec![missing_pk(4040)]);
    assert_eq!(fields["description"], vec![BLANK.to_owned()]);
    assert!(store.reservations().is_empty());
}

#[tokio::test]
async fn should_deny_reservation_creation_to_doctor() {
    let store = Store::seeded();
    let (doctor_user, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");

    let result = create_usecase(&store)
        .execute(&doctor, input(reservation_payload(patient.id, doctor_user.id)))
        .await;

    assert!(matches!(
        result,
        Err(ClinicServiceError::PermissionDenied(ref c)) if c == "add_reservation"
    ));
    assert!(store.reservations().is_empty());
}

#[tokio::test]
async fn should_default_list_date_to_today() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let today = date(2025, 3, 1);
    let todays = store.add_reservation(patient.id, doctor.id, today);
    store.add_reservation(patient.id, doctor.id, date(2025, 3, 2));

    let listed = ListReservationsUseCase {
        reservations: store.clone(),
    }
    .execute(
        &admin,
        ListReservationsInput {
            date: None,
            doctor_id: None,
            today,
        },
    )
    .await
    .unwrap();

    assert_eq!(listed, vec![todays]);
}

#[tokio::test]
async fn should_scope_doctor_listing_to_own_reservations() {
    let store = Store::seeded();
    let (doctor_user, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);
    let other = store.add_user("other@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let on = date(2025, 3, 1);
    let own = store.add_reservation(patient.id, doctor_user.id, on);
    store.add_reservation(patient.id, other.id, on);
    let usecase = ListReservationsUseCase {
        reservations: store.clone(),
    };

    let listed = usecase
        .execute(
            &doctor,
            ListReservationsInput {
                date: Some(on),
                doctor_id: None,
                today: on,
            },
        )
        .await
        .unwrap();
    assert_eq!(listed, vec![own]);

    let others = usecase
        .execute(
            &doctor,
            ListReservationsInput {
                date: Some(on),
                doctor_id: Some(other.id),
                today: on,
            },
        )
        .await
        .unwrap();
    assert!(others.is_empty());
}

#[tokio::test]
async fn should_filter_listing_by_doctor() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let first = store.add_user("first@example.com", RoleKind::Doctor);
    let second = store.add_user("second@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let on = date(2025, 3, 1);
    store.add_reservation(patient.id, first.id, on);
    let wanted = store.add_reservation(patient.id, second.id, on);

    let listed = ListReservationsUseCase {
        reservations: store.clone(),
    }
    .execute(
        &receptionist,
        ListReservationsInput {
            date: Some(on),
            doctor_id: Some(second.id),
            today: on,
        },
    )
    .await
    .unwrap();

    assert_eq!(listed, vec![wanted]);
}

#[tokio::test]
async fn should_hide_other_doctors_reservation_from_doctor() {
    let store = Store::seeded();
    let (_, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);
    let other = store.add_user("other@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let theirs = store.add_reservation(patient.id, other.id, date(2025, 3, 1));

    let result = GetReservationUseCase {
        reservations: store.clone(),
    }
    .execute(&doctor, theirs.id)
    .await;

    assert!(matches!(result, Err(ClinicServiceError::ReservationNotFound)));
}

#[tokio::test]
async fn should_patch_reservation_and_keep_other_fields() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let reservation = store.add_reservation(patient.id, doctor.id, date(2025, 3, 1));

    let updated = UpdateReservationUseCase {
        reservations: store.clone(),
        patients: store.clone(),
        users: store.clone(),
    }
    .execute(
        &receptionist,
        reservation.id,
        input(serde_json::json!({ "time": "09:30:00", "requirements": "x-ray" })),
        WriteMode::Partial,
    )
    .await
    .unwrap();

    assert_eq!(updated.time, time(9, 30));
    assert_eq!(updated.requirements.as_deref(), Some("x-ray"));
    assert_eq!(updated.description, reservation.description);
    assert_eq!(updated.date, reservation.date);
}

#[tokio::test]
async fn should_return_not_found_on_second_reservation_delete() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let reservation = store.add_reservation(patient.id, doctor.id, date(2025, 3, 1));
    let usecase = DeleteReservationUseCase {
        reservations: store.clone(),
    };

    usecase.execute(&admin, reservation.id).await.unwrap();
    let second = usecase.execute(&admin, reservation.id).await;

    assert!(matches!(second, Err(ClinicServiceError::ReservationNotFound)));
}

#[tokio::test]
async fn should_deny_reservation_deletion_to_receptionist() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let reservation = store.add_reservation(patient.id, doctor.id, date(2025, 3, 1));

    let result = DeleteReservationUseCase {
        reservations: store.clone(),
    }
    .execute(&receptionist, reservation.id)
    .await;

    assert!(matches!(result, Err(ClinicServiceError::PermissionDenied(_))));
    assert_eq!(store.reservations().len(), 1);
}

#[tokio::test]
async fn should_report_not_found_when_reservation_vanishes_before_update() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let doctor = store.add_user("doc@example.com", RoleKind::Doctor);
    let patient = store.add_patient("Omar");
    let reservation = store.add_reservation(patient.id, doctor.id, date(2025, 3, 1));
    store.data.lock().unwrap().delete_before_update = true;

    let result = UpdateReservationUseCase {
        reservations: store.clone(),
        patients: store.clone(),
        users: store.clone(),
    }
    .execute(
        &admin,
        reservation.id,
        input(serde_json::json!({ "description": "follow-up" })),
        WriteMode::Partial,
    )
    .await;

    assert!(matches!(result, Err(ClinicServiceError::ReservationNotFound)));
}
