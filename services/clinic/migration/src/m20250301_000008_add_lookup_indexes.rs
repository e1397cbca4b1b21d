use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(Reservations::Table)
                    .col(Reservations::Date)
                    .col(Reservations::DoctorId)
                    .name("idx_reservations_date_doctor_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Patients::Table)
                    .col(Patients::Name)
                    .name("idx_patients_name")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Users::Table)
                    .col(Users::RoleId)
                    .name("idx_users_role_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_users_role_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_patients_name").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_reservations_date_doctor_id")
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Reservations {
    Table,
    Date,
    DoctorId,
}

#[derive(Iden)]
enum Patients {
    Table,
    Name,
}

#[derive(Iden)]
enum Users {
    Table,
    RoleId,
}
