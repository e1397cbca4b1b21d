use std::collections::HashSet;

use clinic_domain::permission::{Permission, Resource};

use crate::domain::guard::Principal;
use crate::domain::repository::{PatientRepository, SpreadsheetReader};
use crate::domain::types::{
    CellDate, FieldErrors, ImportReport, ImportRow, PatientFields, REQUIRED, RowOutcome,
    patient_errors,
};
use crate::error::ClinicServiceError;

pub const INVALID_DATE: &str = "Date has wrong format. Use YYYY-MM-DD.";
pub const NO_FILE: &str = "No file was submitted.";

// ── ImportPatients ───────────────────────────────────────────────────────────

pub struct ImportPatientsUseCase<P: PatientRepository, S: SpreadsheetReader> {
    pub patients: P,
    pub reader: S,
}

impl<P: PatientRepository, S: SpreadsheetReader> ImportPatientsUseCase<P, S> {
    /// Validate each row on its own, skip names that already exist, then
    /// insert the remaining rows in one batch.
    pub async fn execute(
        &self,
        principal: &Principal,
        file: Option<&[u8]>,
    ) -> Result<ImportReport, ClinicServiceError> {
        principal.require(Permission::add(Resource::Patient))?;
        let file = file.ok_or_else(|| ClinicServiceError::field("file", NO_FILE))?;
        let rows = self.reader.read_rows(file)?;

        let mut outcomes = Vec::with_capacity(rows.len());
        let mut valid = Vec::new();
        for row in rows {
            match validate_row(row) {
                Ok((line, fields)) => valid.push((line, fields)),
                Err(outcome) => outcomes.push(outcome),
            }
        }

        let names: Vec<String> = valid.iter().map(|(_, f)| f.name.clone()).collect();
        let mut seen = if names.is_empty() {
            HashSet::new()
        } else {
            self.patients.existing_names(&names).await?
        };

        let mut to_insert = Vec::new();
        for (line, fields) in valid {
            if seen.insert(fields.name.clone()) {
                outcomes.push(RowOutcome::Created {
                    line,
                    name: fields.name.clone(),
                });
                to_insert.push(fields);
            } else {
                outcomes.push(RowOutcome::Skipped {
                    line,
                    name: fields.name,
                });
            }
        }

        let created = if to_insert.is_empty() {
            0
        } else {
            self.patients.create_many(&to_insert).await?
        };
        outcomes.sort_by_key(outcome_line);
        tracing::info!(created, rows = outcomes.len(), "patient import finished");
        Ok(ImportReport {
            created,
            rows: outcomes,
        })
    }
}

fn validate_row(row: ImportRow) -> Result<(usize, PatientFields), RowOutcome> {
    let name = row.name.trim().to_owned();
    let phone_number = row.phone_number.trim().to_owned();
    let mut errors: FieldErrors = patient_errors(&name, &phone_number);
    let birth_date = match row.birth_date {
        CellDate::Date(date) => Some(date),
        CellDate::Invalid(_) => {
            errors.add("birth_date", INVALID_DATE);
            None
        }
        CellDate::Missing => {
            errors.add("birth_date", REQUIRED);
            None
        }
    };
    match birth_date {
        Some(birth_date) if errors.is_empty() => Ok((
            row.line,
            PatientFields {
                name,
                relative: row.relative,
                relative_name: row.relative_name,
                phone_number,
                birth_date,
            },
        )),
        _ => Err(RowOutcome::Rejected {
            line: row.line,
            errors: errors.into_messages(),
        }),
    }
}

fn outcome_line(outcome: &RowOutcome) -> usize {
    match outcome {
        RowOutcome::Created { line, .. }
        | RowOutcome::Skipped { line, .. }
        | RowOutcome::Rejected { line, .. } => *line,
    }
}
