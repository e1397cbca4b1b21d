use chrono::NaiveDate;

use clinic_domain::permission::{Permission, Resource};
use clinic_domain::role::is_doctor;

use crate::domain::guard::{Principal, ReadScope};
use crate::domain::repository::{PatientRepository, ReservationRepository, UserRepository};
use crate::domain::types::{
    BLANK, FieldErrors, Reservation, ReservationFilter, ReservationInput, WriteMode, missing_pk,
};
use crate::error::ClinicServiceError;

const RESOURCE: Resource = Resource::Reservation;

pub const NOT_A_DOCTOR: &str = "Selected user is not a doctor.";

// ── ListReservations ─────────────────────────────────────────────────────────

/// Query parameters for listing. `date` falls back to the caller's today.
pub struct ListReservationsInput {
    pub date: Option<NaiveDate>,
    pub doctor_id: Option<i32>,
    pub today: NaiveDate,
}

pub struct ListReservationsUseCase<R: ReservationRepository> {
    pub reservations: R,
}

impl<R: ReservationRepository> ListReservationsUseCase<R> {
    pub async fn execute(
        &self,
        principal: &Principal,
        input: ListReservationsInput,
    ) -> Result<Vec<Reservation>, ClinicServiceError> {
        let scope = principal.reservation_scope()?;
        let doctor_id = match (scope, input.doctor_id) {
            (ReadScope::All, requested) => requested,
            (ReadScope::Own(own), None) => Some(own),
            (ReadScope::Own(own), Some(requested)) if requested == own => Some(own),
            // Asking for another doctor's rows from an own-only scope.
            (ReadScope::Own(_), Some(_)) => return Ok(vec![]),
        };
        let filter = ReservationFilter {
            date: input.date.unwrap_or(input.today),
            doctor_id,
        };
        self.reservations.list(&filter).await
    }
}

// ── GetReservation ───────────────────────────────────────────────────────────

pub struct GetReservationUseCase<R: ReservationRepository> {
    pub reservations: R,
}

impl<R: ReservationRepository> GetReservationUseCase<R> {
    /// Rows outside the caller's scope are reported as missing.
    pub async fn execute(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<Reservation, ClinicServiceError> {
        let scope = principal.reservation_scope()?;
        self.reservations
            .find_by_id(id)
            .await?
            .filter(|r| scope.doctor_id().is_none_or(|own| r.doctor_id == own))
            .ok_or(ClinicServiceError::ReservationNotFound)
    }
}

// ── CreateReservation ────────────────────────────────────────────────────────

pub struct CreateReservationUseCase<R, P, U>
where
    R: ReservationRepository,
    P: PatientRepository,
    U: UserRepository,
{
    pub reservations: R,
    pub patients: P,
    pub users: U,
}

impl<R, P, U> CreateReservationUseCase<R, P, U>
where
    R: ReservationRepository,
    P: PatientRepository,
    U: UserRepository,
{
    pub async fn execute(
        &self,
        principal: &Principal,
        input: ReservationInput,
    ) -> Result<Reservation, ClinicServiceError> {
        principal.require(Permission::add(RESOURCE))?;
        let fields = input.into_fields()?;
        check_reservation(
            &self.patients,
            &self.users,
            fields.patient_id,
            fields.doctor_id,
            &fields.description,
        )
        .await?;
        let reservation = self.reservations.create(&fields).await?;
        tracing::info!(
            reservation_id = reservation.id,
            doctor_id = reservation.doctor_id,
            "reservation created"
        );
        Ok(reservation)
    }
}

// ── UpdateReservation ────────────────────────────────────────────────────────

pub struct UpdateReservationUseCase<R, P, U>
where
    R: ReservationRepository,
    P: PatientRepository,
    U: UserRepository,
{
    pub reservations: R,
    pub patients: P,
    pub users: U,
}

impl<R, P, U> UpdateReservationUseCase<R, P, U>
where
    R: ReservationRepository,
    P: PatientRepository,
    U: UserRepository,
{
    pub async fn execute(
        &self,
        principal: &Principal,
        id: i32,
        input: ReservationInput,
        mode: WriteMode,
    ) -> Result<Reservation, ClinicServiceError> {
        principal.require(Permission::change(RESOURCE))?;
        let current = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or(ClinicServiceError::ReservationNotFound)?;
        let updated = match mode {
            WriteMode::Replace => input.into_fields()?.into_reservation(current.id),
            WriteMode::Partial => input.apply(current),
        };
        check_reservation(
            &self.patients,
            &self.users,
            updated.patient_id,
            updated.doctor_id,
            &updated.description,
        )
        .await?;
        if !self.reservations.update(&updated).await? {
            return Err(ClinicServiceError::ReservationNotFound);
        }
        Ok(updated)
    }
}

// ── DeleteReservation ────────────────────────────────────────────────────────

pub struct DeleteReservationUseCase<R: ReservationRepository> {
    pub reservations: R,
}

impl<R: ReservationRepository> DeleteReservationUseCase<R> {
    pub async fn execute(&self, principal: &Principal, id: i32) -> Result<(), ClinicServiceError> {
        principal.require(Permission::delete(RESOURCE))?;
        if !self.reservations.delete(id).await? {
            return Err(ClinicServiceError::ReservationNotFound);
        }
        Ok(())
    }
}

/// The patient must exist and the doctor must be a user with the Doctor role.
async fn check_reservation<P, U>(
    patients: &P,
    users: &U,
    patient_id: i32,
    doctor_id: i32,
    description: &str,
) -> Result<(), ClinicServiceError>
where
    P: PatientRepository,
    U: UserRepository,
{
    let mut errors = FieldErrors::default();
    if description.trim().is_empty() {
        errors.add("description", BLANK);
    }
    if patients.find_by_id(patient_id).await?.is_none() {
        errors.add("patient", missing_pk(patient_id));
    }
    match users.find_by_id(doctor_id).await? {
        Some(doctor) if is_doctor(&doctor.role.name) => {}
        Some(_) => errors.add("doctor", NOT_A_DOCTOR),
        None => errors.add("doctor", missing_pk(doctor_id)),
    }
    errors.into_result()
}
