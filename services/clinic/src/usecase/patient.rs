use clinic_domain::permission::{Permission, Resource};

use crate::domain::guard::Principal;
use crate::domain::repository::PatientRepository;
use crate::domain::types::{Patient, PatientFilter, PatientInput, WriteMode};
use crate::error::ClinicServiceError;

const RESOURCE: Resource = Resource::Patient;

// ── ListPatients ─────────────────────────────────────────────────────────────

pub struct ListPatientsUseCase<P: PatientRepository> {
    pub patients: P,
}

impl<P: PatientRepository> ListPatientsUseCase<P> {
    pub async fn execute(
        &self,
        principal: &Principal,
        filter: PatientFilter,
    ) -> Result<Vec<Patient>, ClinicServiceError> {
        principal.require(Permission::view(RESOURCE))?;
        self.patients.list(&filter).await
    }
}

// ── GetPatient ───────────────────────────────────────────────────────────────

pub struct GetPatientUseCase<P: PatientRepository> {
    pub patients: P,
}

impl<P: PatientRepository> GetPatientUseCase<P> {
    pub async fn execute(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<Patient, ClinicServiceError> {
        principal.require(Permission::view(RESOURCE))?;
        self.patients
            .find_by_id(id)
            .await?
            .ok_or(ClinicServiceError::PatientNotFound)
    }
}

// ── CreatePatient ────────────────────────────────────────────────────────────

pub struct CreatePatientUseCase<P: PatientRepository> {
    pub patients: P,
}

impl<P: PatientRepository> CreatePatientUseCase<P> {
    pub async fn execute(
        &self,
        principal: &Principal,
        input: PatientInput,
    ) -> Result<Patient, ClinicServiceError> {
        principal.require(Permission::add(RESOURCE))?;
        let fields = input.into_fields()?;
        fields.validate()?;
        let patient = self.patients.create(&fields).await?;
        tracing::info!(patient_id = patient.id, "patient created");
        Ok(patient)
    }
}

// ── UpdatePatient ────────────────────────────────────────────────────────────

pub struct UpdatePatientUseCase<P: PatientRepository> {
    pub patients: P,
}

impl<P: PatientRepository> UpdatePatientUseCase<P> {
    /// Serves both PUT and PATCH.
    pub async fn execute(
        &self,
        principal: &Principal,
        id: i32,
        input: PatientInput,
        mode: WriteMode,
    ) -> Result<Patient, ClinicServiceError> {
        principal.require(Permission::change(RESOURCE))?;
        let current = self
            .patients
            .find_by_id(id)
            .await?
            .ok_or(ClinicServiceError::PatientNotFound)?;
        let updated = match mode {
            WriteMode::Replace => input.into_fields()?.into_patient(current.id),
            WriteMode::Partial => input.apply(current),
        };
        updated.validate()?;
        if !self.patients.update(&updated).await? {
            return Err(ClinicServiceError::PatientNotFound);
        }
        Ok(updated)
    }
}

// ── DeletePatient ────────────────────────────────────────────────────────────

pub struct DeletePatientUseCase<P: PatientRepository> {
    pub patients: P,
}

impl<P: PatientRepository> DeletePatientUseCase<P> {
    pub async fn execute(&self, principal: &Principal, id: i32) -> Result<(), ClinicServiceError> {
        principal.require(Permission::delete(RESOURCE))?;
        if !self.patients.delete(id).await? {
            return Err(ClinicServiceError::PatientNotFound);
        }
        tracing::info!(patient_id = id, "patient deleted");
        Ok(())
    }
}
