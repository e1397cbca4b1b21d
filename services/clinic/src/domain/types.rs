use chrono::{NaiveDate, NaiveTime};

use clinic_core::error::FieldMessages;

use crate::error::ClinicServiceError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 5;

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

pub const INVALID_PHONE_NUMBER: &str = "Please enter a valid phone number.";
pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

// ── Roles ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: i32,
    pub name: String,
}

// ── Users ────────────────────────────────────────────────────────────────────

/// Staff account with its role name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub role: Role,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Login material for one account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: i32,
    pub password_hash: String,
    pub is_active: bool,
}

/// A user row ready to be persisted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Field updates for a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub address: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Exact role name.
    pub role: Option<String>,
    /// Name prefix.
    pub name: Option<String>,
}

// ── Patients ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: i32,
    pub name: String,
    pub relative: Option<String>,
    pub relative_name: Option<String>,
    pub phone_number: String,
    pub birth_date: NaiveDate,
}

/// Writable patient columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFields {
    pub name: String,
    pub relative: Option<String>,
    pub relative_name: Option<String>,
    pub phone_number: String,
    pub birth_date: NaiveDate,
}

impl Patient {
    pub fn validate(&self) -> Result<(), ClinicServiceError> {
        patient_errors(&self.name, &self.phone_number).into_result()
    }
}

impl PatientFields {
    pub fn validate(&self) -> Result<(), ClinicServiceError> {
        patient_errors(&self.name, &self.phone_number).into_result()
    }

    pub fn into_patient(self, id: i32) -> Patient {
        Patient {
            id,
            name: self.name,
            relative: self.relative,
            relative_name: self.relative_name,
            phone_number: self.phone_number,
            birth_date: self.birth_date,
        }
    }
}

/// Whether a write replaces every writable field (PUT) or only the ones sent (PATCH).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    Partial,
}

/// Patient fields as sent by a client. `None` means the field was absent;
/// `Some(None)` on a nullable field means an explicit null.
#[derive(Debug, Clone, Default)]
pub struct PatientInput {
    pub name: Option<String>,
    pub relative: Option<Option<String>>,
    pub relative_name: Option<Option<String>>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl PatientInput {
    /// Absent nullable fields become null. Missing required fields are field errors.
    pub fn into_fields(self) -> Result<PatientFields, ClinicServiceError> {
        let mut errors = FieldErrors::default();
        if self.name.is_none() {
            errors.add("name", REQUIRED);
        }
        if self.phone_number.is_none() {
            errors.add("phone_number", REQUIRED);
        }
        if self.birth_date.is_none() {
            errors.add("birth_date", REQUIRED);
        }
        match (self.name, self.phone_number, self.birth_date) {
            (Some(name), Some(phone_number), Some(birth_date)) => Ok(PatientFields {
                name,
                relative: self.relative.flatten(),
                relative_name: self.relative_name.flatten(),
                phone_number,
                birth_date,
            }),
            _ => Err(ClinicServiceError::Validation(errors.into_messages())),
        }
    }

    pub fn apply(self, mut patient: Patient) -> Patient {
        if let Some(name) = self.name {
            patient.name = name;
        }
        if let Some(relative) = self.relative {
            patient.relative = relative;
        }
        if let Some(relative_name) = self.relative_name {
            patient.relative_name = relative_name;
        }
        if let Some(phone_number) = self.phone_number {
            patient.phone_number = phone_number;
        }
        if let Some(birth_date) = self.birth_date {
            patient.birth_date = birth_date;
        }
        patient
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    /// Name prefix.
    pub name: Option<String>,
}

// ── Reservations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub requirements: Option<String>,
    pub patient_reminder: Option<NaiveTime>,
    pub doctor_reminder: Option<NaiveTime>,
}

/// Writable reservation columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationFields {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub requirements: Option<String>,
    pub patient_reminder: Option<NaiveTime>,
    pub doctor_reminder: Option<NaiveTime>,
}

impl ReservationFields {
    pub fn into_reservation(self, id: i32) -> Reservation {
        Reservation {
            id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            date: self.date,
            time: self.time,
            description: self.description,
            requirements: self.requirements,
            patient_reminder: self.patient_reminder,
            doctor_reminder: self.doctor_reminder,
        }
    }
}

/// Reservation fields as sent by a client, with the same absent/null split as
/// [`PatientInput`].
#[derive(Debug, Clone, Default)]
pub struct ReservationInput {
    pub patient_id: Option<i32>,
    pub doctor_id: Option<i32>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub description: Option<String>,
    pub requirements: Option<Option<String>>,
    pub patient_reminder: Option<Option<NaiveTime>>,
    pub doctor_reminder: Option<Option<NaiveTime>>,
}

impl ReservationInput {
    pub fn into_fields(self) -> Result<ReservationFields, ClinicServiceError> {
        let mut errors = FieldErrors::default();
        if self.patient_id.is_none() {
            errors.add("patient", REQUIRED);
        }
        if self.doctor_id.is_none() {
            errors.add("doctor", REQUIRED);
        }
        if self.date.is_none() {
            errors.add("date", REQUIRED);
        }
        if self.time.is_none() {
            errors.add("time", REQUIRED);
        }
        if self.description.is_none() {
            errors.add("description", REQUIRED);
        }
        match (
            self.patient_id,
            self.doctor_id,
            self.date,
            self.time,
            self.description,
        ) {
            (Some(patient_id), Some(doctor_id), Some(date), Some(time), Some(description)) => {
                Ok(ReservationFields {
                    patient_id,
                    doctor_id,
                    date,
                    time,
                    description,
                    requirements: self.requirements.flatten(),
                    patient_reminder: self.patient_reminder.flatten(),
                    doctor_reminder: self.doctor_reminder.flatten(),
                })
            }
            _ => Err(ClinicServiceError::Validation(errors.into_messages())),
        }
    }

    pub fn apply(self, mut reservation: Reservation) -> Reservation {
        if let Some(patient_id) = self.patient_id {
            reservation.patient_id = patient_id;
        }
        if let Some(doctor_id) = self.doctor_id {
            reservation.doctor_id = doctor_id;
        }
        if let Some(date) = self.date {
            reservation.date = date;
        }
        if let Some(time) = self.time {
            reservation.time = time;
        }
        if let Some(description) = self.description {
            reservation.description = description;
        }
        if let Some(requirements) = self.requirements {
            reservation.requirements = requirements;
        }
        if let Some(patient_reminder) = self.patient_reminder {
            reservation.patient_reminder = patient_reminder;
        }
        if let Some(doctor_reminder) = self.doctor_reminder {
            reservation.doctor_reminder = doctor_reminder;
        }
        reservation
    }
}

#[derive(Debug, Clone)]
pub struct ReservationFilter {
    pub date: NaiveDate,
    pub doctor_id: Option<i32>,
}

// ── Import ───────────────────────────────────────────────────────────────────

/// One data row of an uploaded patient sheet, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based sheet row number, header included.
    pub line: usize,
    pub name: String,
    pub relative: Option<String>,
    pub relative_name: Option<String>,
    pub phone_number: String,
    pub birth_date: CellDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellDate {
    Date(NaiveDate),
    /// Cell text that is not a date.
    Invalid(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created { line: usize, name: String },
    /// A patient with this name exists, or appeared earlier in the sheet.
    Skipped { line: usize, name: String },
    Rejected { line: usize, errors: FieldMessages },
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub created: u64,
    pub rows: Vec<RowOutcome>,
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Collects field-level messages before any write happens.
#[derive(Debug, Default)]
pub struct FieldErrors(FieldMessages);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ClinicServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ClinicServiceError::Validation(self.0))
        }
    }

    pub fn into_messages(self) -> FieldMessages {
        self.0
    }
}

pub fn patient_errors(name: &str, phone_number: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if name.trim().is_empty() {
        errors.add("name", BLANK);
    }
    if !is_valid_phone_number(phone_number) {
        errors.add("phone_number", INVALID_PHONE_NUMBER);
    }
    errors
}

/// Message for a reference to a row that does not exist.
pub fn missing_pk(id: i32) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// Digits only, at least [`MIN_PHONE_DIGITS`] of them.
pub fn is_valid_phone_number(phone_number: &str) -> bool {
    phone_number.len() >= MIN_PHONE_DIGITS && phone_number.bytes().all(|b| b.is_ascii_digit())
}

/// Lower-case the domain part; the local part is kept as given.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_owned(),
    }
}

/// One `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
