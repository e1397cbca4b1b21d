use clinic_domain::permission::Permission;
use sea_orm_migration::prelude::*;

/// Inserts one row per catalog permission. The seeder reads these rows and
/// refuses to run if a resource has none.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(Permissions::Table)
            .columns([Permissions::Codename, Permissions::Resource])
            .on_conflict(
                OnConflict::column(Permissions::Codename)
                    .do_nothing()
                    .to_owned(),
            );
        for permission in Permission::catalog() {
            insert.values_panic([
                permission.codename().into(),
                permission.resource.as_str().into(),
            ]);
        }
        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let codenames: Vec<String> = Permission::catalog()
            .into_iter()
            .map(Permission::codename)
            .collect();
        let delete = Query::delete()
            .from_table(Permissions::Table)
            .and_where(Expr::col(Permissions::Codename).is_in(codenames))
            .to_owned();
        manager.exec_stmt(delete).await
    }
}

#[derive(Iden)]
enum Permissions {
    Table,
    Codename,
    Resource,
}
