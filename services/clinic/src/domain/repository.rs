#![allow(async_fn_in_trait)]

use std::collections::HashSet;

use clinic_auth_types::token::TokenKey;
use clinic_domain::group::Group;
use clinic_domain::permission::{Permission, Resource};

use crate::domain::guard::Principal;
use crate::domain::types::{
    Credentials, ImportRow, NewUser, Patient, PatientFields, PatientFilter, Reservation,
    ReservationFields, ReservationFilter, Role, User, UserChanges, UserFilter,
};
use crate::error::ClinicServiceError;

/// Roles, groups and their permission grants.
pub trait AccessRepository: Send + Sync {
    async fn find_role(&self, id: i32) -> Result<Option<Role>, ClinicServiceError>;

    /// Get-or-create a role. The flag is `true` if the row was created.
    async fn ensure_role(&self, name: &str) -> Result<(Role, bool), ClinicServiceError>;

    /// Get-or-create a group. Returns `true` if the row was created.
    async fn ensure_group(&self, group: Group) -> Result<bool, ClinicServiceError>;

    /// Persisted permission rows scoped to one resource.
    async fn permissions_for(
        &self,
        resource: Resource,
    ) -> Result<Vec<Permission>, ClinicServiceError>;

    /// Attach a permission to a group. Returns `true` if the grant is new.
    async fn grant(&self, group: Group, permission: Permission)
    -> Result<bool, ClinicServiceError>;
}

/// Repository for staff accounts.
pub trait UserRepository: Send + Sync {
    /// Ordered by id.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, ClinicServiceError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ClinicServiceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ClinicServiceError>;

    async fn credentials(&self, email: &str) -> Result<Option<Credentials>, ClinicServiceError>;

    /// Insert the user and enroll it in `group`, atomically.
    async fn create(&self, user: &NewUser, group: Group) -> Result<User, ClinicServiceError>;

    /// Apply `changes`. With `group` set, membership is replaced by that
    /// single group in the same transaction.
    async fn update(
        &self,
        id: i32,
        changes: &UserChanges,
        group: Option<Group>,
    ) -> Result<Option<User>, ClinicServiceError>;

    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError>;
}

/// Repository for patients.
pub trait PatientRepository: Send + Sync {
    /// Ordered by id.
    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, ClinicServiceError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Patient>, ClinicServiceError>;

    async fn create(&self, fields: &PatientFields) -> Result<Patient, ClinicServiceError>;

    /// Overwrite every writable column. Returns `false` if the row is gone.
    async fn update(&self, patient: &Patient) -> Result<bool, ClinicServiceError>;

    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError>;

    /// Which of `names` already belong to a patient.
    async fn existing_names(
        &self,
        names: &[String],
    ) -> Result<HashSet<String>, ClinicServiceError>;

    /// Bulk insert. Returns the number of rows written.
    async fn create_many(&self, rows: &[PatientFields]) -> Result<u64, ClinicServiceError>;
}

/// Repository for reservations.
pub trait ReservationRepository: Send + Sync {
    /// Rows on `filter.date`, narrowed to one doctor when `doctor_id` is set.
    /// Ordered by id.
    async fn list(
        &self,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>, ClinicServiceError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Reservation>, ClinicServiceError>;

    async fn create(&self, fields: &ReservationFields) -> Result<Reservation, ClinicServiceError>;

    /// Returns `false` if the row is gone.
    async fn update(&self, reservation: &Reservation) -> Result<bool, ClinicServiceError>;

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError>;
}

/// API tokens and the identities behind them.
pub trait TokenRepository: Send + Sync {
    /// The user's existing key, or `candidate` once stored.
    async fn get_or_create(
        &self,
        user_id: i32,
        candidate: &TokenKey,
    ) -> Result<TokenKey, ClinicServiceError>;

    /// Resolve a key to an active user with its groups and permissions.
    async fn principal(&self, key: &TokenKey) -> Result<Option<Principal>, ClinicServiceError>;
}

/// Reads patient rows out of an uploaded workbook.
pub trait SpreadsheetReader: Send + Sync {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<ImportRow>, ClinicServiceError>;
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, ClinicServiceError>;

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, ClinicServiceError>;
}
