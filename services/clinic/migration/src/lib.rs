use sea_orm_migration::prelude::*;

mod m20250301_000001_create_roles;
mod m20250301_000002_create_access_control;
mod m20250301_000003_insert_permissions;
mod m20250301_000004_create_users;
mod m20250301_000005_create_patients;
mod m20250301_000006_create_reservations;
mod m20250301_000007_create_auth_tokens;
mod m20250301_000008_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_roles::Migration),
            Box::new(m20250301_000002_create_access_control::Migration),
            Box::new(m20250301_000003_insert_permissions::Migration),
            Box::new(m20250301_000004_create_users::Migration),
            Box::new(m20250301_000005_create_patients::Migration),
            Box::new(m20250301_000006_create_reservations::Migration),
            Box::new(m20250301_000007_create_auth_tokens::Migration),
            Box::new(m20250301_000008_add_lookup_indexes::Migration),
        ]
    }
}
