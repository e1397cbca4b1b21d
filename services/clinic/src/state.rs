use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbAccessRepository, DbPatientRepository, DbReservationRepository, DbTokenRepository,
    DbUserRepository,
};
use crate::infra::password::BcryptPasswordHasher;
use crate::infra::spreadsheet::CalamineReader;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn access_repo(&self) -> DbAccessRepository {
        DbAccessRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn patient_repo(&self) -> DbPatientRepository {
        DbPatientRepository {
            db: self.db.clone(),
        }
    }

    pub fn reservation_repo(&self) -> DbReservationRepository {
        DbReservationRepository {
            db: self.db.clone(),
        }
    }

    pub fn token_repo(&self) -> DbTokenRepository {
        DbTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn hasher(&self) -> BcryptPasswordHasher {
        BcryptPasswordHasher {
            cost: self.bcrypt_cost,
        }
    }

    pub fn spreadsheet_reader(&self) -> CalamineReader {
        CalamineReader
    }
}
