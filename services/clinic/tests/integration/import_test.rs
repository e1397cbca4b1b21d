use clinic::domain::types::{CellDate, ImportRow, REQUIRED, RowOutcome};
use clinic::error::ClinicServiceError;
use clinic::usecase::import::{INVALID_DATE, ImportPatientsUseCase, NO_FILE};
use clinic_domain::role::RoleKind;

use crate::helpers::{MockReader, Store, date, staff};

fn row(line: usize, name: &str, phone_number: &str, birth_date: CellDate) -> ImportRow {
    ImportRow {
        line,
        name: name.to_owned(),
        relative: None,
        relative_name: None,
        phone_number: phone_number.to_owned(),
        birth_date,
    }
}

fn born() -> CellDate {
    CellDate::Date(date(2001, 1, 2))
}

#[tokio::test]
async fn should_create_valid_rows_and_report_each_line() {
    let store = Store::seeded();
    let (_, receptionist) = staff(&store, "desk@example.com", RoleKind::Receptionist);
    store.add_patient("Omar");
    let usecase = ImportPatientsUseCase {
        patients: store.clone(),
        reader: MockReader {
            rows: vec![
                row(2, "Mona", "0123456789", born()),
                row(3, "Omar", "0123456789", born()),
                row(4, "Ali", "12", CellDate::Invalid("yesterday".into())),
                row(5, "Mona", "0111111111", born()),
                row(6, "Salma", "0100000000", CellDate::Missing),
                row(7, "Youssef", "0100000001", born()),
            ],
        },
    };

    let report = usecase
        .execute(&receptionist, Some(b"workbook".as_slice()))
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    let lines: Vec<usize> = report
        .rows
        .iter()
        .map(|r| match r {
            RowOutcome::Created { line, .. }
            | RowOutcome::Skipped { line, .. }
            | RowOutcome::Rejected { line, .. } => *line,
        })
        .collect();
    assert_eq!(lines, vec![2, 3, 4, 5, 6, 7]);
    assert!(matches!(&report.rows[0], RowOutcome::Created { name, .. } if name == "Mona"));
    assert!(matches!(&report.rows[1], RowOutcome::Skipped { name, .. } if name == "Omar"));
    let RowOutcome::Rejected { errors, .. } = &report.rows[2] else {
        panic!("expected line 4 to be rejected");
    };
    assert!(errors.contains_key("phone_number"));
    assert_eq!(errors["birth_date"], vec![INVALID_DATE.to_owned()]);
    assert!(matches!(&report.rows[3], RowOutcome::Skipped { name, .. } if name == "Mona"));
    let RowOutcome::Rejected { errors, .. } = &report.rows[4] else {
        panic!("expected line 6 to be rejected");
    };
    assert_eq!(errors["birth_date"], vec![REQUIRED.to_owned()]);

    let names: Vec<String> = store.patients().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Omar", "Mona", "Youssef"]);
}

#[tokio::test]
async fn should_deny_import_to_doctor() {
    let store = Store::seeded();
    let (_, doctor) = staff(&store, "doc@example.com", RoleKind::Doctor);
    let usecase = ImportPatientsUseCase {
        patients: store.clone(),
        reader: MockReader {
            rows: vec![row(2, "Mona", "0123456789", born())],
        },
    };

    let result = usecase.execute(&doctor, Some(b"workbook".as_slice())).await;

    assert!(matches!(
        result,
        Err(ClinicServiceError::PermissionDenied(ref c)) if c == "add_patient"
    ));
    assert!(store.patients().is_empty());
}

#[tokio::test]
async fn should_require_a_file() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let usecase = ImportPatientsUseCase {
        patients: store.clone(),
        reader: MockReader { rows: vec![] },
    };

    let result = usecase.execute(&admin, None).await;

    let Err(ClinicServiceError::Validation(fields)) = result else {
        panic!("expected validation failure");
    };
    assert_eq!(fields["file"], vec![NO_FILE.to_owned()]);
}

#[tokio::test]
async fn should_write_nothing_when_every_row_is_rejected() {
    let store = Store::seeded();
    let (_, admin) = staff(&store, "admin@example.com", RoleKind::Admin);
    let usecase = ImportPatientsUseCase {
        patients: store.clone(),
        reader: MockReader {
            rows: vec![row(2, " ", "0123456789", born()), row(3, "Ali", "abc", born())],
        },
    };

    let report = usecase
        .execute(&admin, Some(b"workbook".as_slice()))
        .await
        .unwrap();

    assert_eq!(report.created, 0);
    assert!(
        report
            .rows
            .iter()
            .all(|r| matches!(r, RowOutcome::Rejected { .. }))
    );
    assert!(store.patients().is_empty());
}
