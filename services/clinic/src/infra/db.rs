use std::collections::{BTreeSet, HashSet};

use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, SqlErr,
    TransactionError, TransactionTrait, sea_query::OnConflict,
};

use clinic_auth_types::token::TokenKey;
use clinic_domain::group::Group;
use clinic_domain::permission::{Action, Permission, Resource};
use clinic_schema::{
    auth_tokens, group_permissions, groups, patients, permissions, reservations, roles,
    user_groups, users,
};

use crate::domain::guard::Principal;
use crate::domain::repository::{
    AccessRepository, PatientRepository, ReservationRepository, TokenRepository, UserRepository,
};
use crate::domain::types::{
    Credentials, NewUser, Patient, PatientFields, PatientFilter, Reservation, ReservationFields,
    ReservationFilter, Role, User, UserChanges, UserFilter,
};
use crate::error::ClinicServiceError;

const DUPLICATE_EMAIL: &str = "user with this email already exists.";

// ── Access repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccessRepository {
    pub db: DatabaseConnection,
}

impl AccessRepository for DbAccessRepository {
    async fn find_role(&self, id: i32) -> Result<Option<Role>, ClinicServiceError> {
        let model = roles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find role by id")?;
        Ok(model.map(role_from_model))
    }

    async fn ensure_role(&self, name: &str) -> Result<(Role, bool), ClinicServiceError> {
        let existing = roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("find role by name")?;
        if let Some(model) = existing {
            return Ok((role_from_model(model), false));
        }
        let model = roles::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create role")?;
        Ok((role_from_model(model), true))
    }

    async fn ensure_group(&self, group: Group) -> Result<bool, ClinicServiceError> {
        if find_group_id(&self.db, group)
            .await
            .context("find group")?
            .is_some()
        {
            return Ok(false);
        }
        groups::ActiveModel {
            name: Set(group.name().to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create group")?;
        Ok(true)
    }

    async fn permissions_for(
        &self,
        resource: Resource,
    ) -> Result<Vec<Permission>, ClinicServiceError> {
        let models = permissions::Entity::find()
            .filter(permissions::Column::Resource.eq(resource.as_str()))
            .order_by_asc(permissions::Column::Id)
            .all(&self.db)
            .await
            .context("list permissions for resource")?;
        Ok(parse_permissions(models))
    }

    async fn grant(
        &self,
        group: Group,
        permission: Permission,
    ) -> Result<bool, ClinicServiceError> {
        let group_id = find_group_id(&self.db, group)
            .await
            .context("find group")?
            .ok_or_else(|| anyhow::anyhow!("group {} does not exist", group.name()))?;
        let permission_id = permissions::Entity::find()
            .filter(permissions::Column::Codename.eq(permission.codename()))
            .one(&self.db)
            .await
            .context("find permission by codename")?
            .ok_or_else(|| anyhow::anyhow!("permission {permission} does not exist"))?
            .id;
        let inserted = group_permissions::Entity::insert(group_permissions::ActiveModel {
            group_id: Set(group_id),
            permission_id: Set(permission_id),
        })
        .on_conflict(
            OnConflict::columns([
                group_permissions::Column::GroupId,
                group_permissions::Column::PermissionId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("grant permission to group")?;
        Ok(inserted > 0)
    }
}

fn role_from_model(model: roles::Model) -> Role {
    Role {
        id: model.id,
        name: model.name,
    }
}

async fn find_group_id<C: ConnectionTrait>(db: &C, group: Group) -> Result<Option<i32>, DbErr> {
    let model = groups::Entity::find()
        .filter(groups::Column::Name.eq(group.name()))
        .one(db)
        .await?;
    Ok(model.map(|m| m.id))
}

/// Rows with codenames outside the catalog are ignored.
fn parse_permissions(models: Vec<permissions::Model>) -> Vec<Permission> {
    models
        .into_iter()
        .filter_map(|m| match m.codename.parse::<Permission>() {
            Ok(permission) => Some(permission),
            Err(e) => {
                tracing::warn!(error = %e, codename = %m.codename, "ignoring unknown permission");
                None
            }
        })
        .collect()
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, ClinicServiceError> {
        let mut query = users::Entity::find().find_also_related(roles::Entity);
        if let Some(ref role) = filter.role {
            query = query.filter(roles::Column::Name.eq(role.as_str()));
        }
        if let Some(ref name) = filter.name {
            query = query.filter(users::Column::Name.starts_with(name.as_str()));
        }
        let rows = query
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .context("list users")?;
        rows.into_iter()
            .map(|(user, role)| user_from_model(user, role))
            .collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ClinicServiceError> {
        let row = users::Entity::find_by_id(id)
            .find_also_related(roles::Entity)
            .one(&self.db)
            .await
            .context("find user by id")?;
        row.map(|(user, role)| user_from_model(user, role))
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ClinicServiceError> {
        let row = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .find_also_related(roles::Entity)
            .one(&self.db)
            .await
            .context("find user by email")?;
        row.map(|(user, role)| user_from_model(user, role))
            .transpose()
    }

    async fn credentials(&self, email: &str) -> Result<Option<Credentials>, ClinicServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find credentials by email")?;
        Ok(model.map(|m| Credentials {
            user_id: m.id,
            password_hash: m.password,
            is_active: m.is_active,
        }))
    }

    async fn create(&self, user: &NewUser, group: Group) -> Result<User, ClinicServiceError> {
        let new = user.clone();
        let model = self
            .db
            .transaction::<_, users::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let model = users::ActiveModel {
                        email: Set(new.email),
                        name: Set(new.name),
                        password: Set(new.password_hash),
                        is_active: Set(true),
                        is_staff: Set(new.is_staff),
                        is_superuser: Set(new.is_superuser),
                        role_id: Set(new.role.id),
                        address: Set(new.address),
                        phone_number: Set(new.phone_number),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    enroll(txn, model.id, group).await?;
                    Ok(model)
                })
            })
            .await
            .map_err(|e| email_conflict(e, "create user"))?;
        Ok(User {
            id: model.id,
            email: model.email,
            name: model.name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            role: user.role.clone(),
            address: model.address,
            phone_number: model.phone_number,
        })
    }

    async fn update(
        &self,
        id: i32,
        changes: &UserChanges,
        group: Option<Group>,
    ) -> Result<Option<User>, ClinicServiceError> {
        let changes = changes.clone();
        let found = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    let Some(model) = users::Entity::find_by_id(id).one(txn).await? else {
                        return Ok(false);
                    };
                    let mut am: users::ActiveModel = model.into();
                    if let Some(email) = changes.email {
                        am.email = Set(email);
                    }
                    if let Some(name) = changes.name {
                        am.name = Set(name);
                    }
                    if let Some(password_hash) = changes.password_hash {
                        am.password = Set(password_hash);
                    }
                    if let Some(role) = changes.role {
                        am.role_id = Set(role.id);
                    }
                    if let Some(address) = changes.address {
                        am.address = Set(address);
                    }
                    if let Some(phone_number) = changes.phone_number {
                        am.phone_number = Set(phone_number);
                    }
                    if am.is_changed() {
                        am.update(txn).await?;
                    }
                    if let Some(group) = group {
                        user_groups::Entity::delete_many()
                            .filter(user_groups::Column::UserId.eq(id))
                            .exec(txn)
                            .await?;
                        enroll(txn, id, group).await?;
                    }
                    Ok(true)
                })
            })
            .await
            .map_err(|e| email_conflict(e, "update user"))?;
        if !found {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }
}

async fn enroll<C: ConnectionTrait>(db: &C, user_id: i32, group: Group) -> Result<(), DbErr> {
    let group_id = find_group_id(db, group)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("group {}", group.name())))?;
    user_groups::Entity::insert(user_groups::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(group_id),
    })
    .exec_without_returning(db)
    .await?;
    Ok(())
}

/// A row deleted after it was read makes the update match nothing.
fn row_updated<M>(result: Result<M, DbErr>) -> Result<bool, DbErr> {
    match result {
        Ok(_) => Ok(true),
        Err(DbErr::RecordNotUpdated) => Ok(false),
        Err(e) => Err(e),
    }
}

/// A unique violation on `users.email` lost a race with the pre-check.
fn email_conflict(err: TransactionError<DbErr>, context: &'static str) -> ClinicServiceError {
    if let TransactionError::Transaction(ref db_err) = err {
        if let Some(SqlErr::UniqueConstraintViolation(_)) = db_err.sql_err() {
            return ClinicServiceError::field("email", DUPLICATE_EMAIL);
        }
    }
    anyhow::Error::new(err).context(context).into()
}

fn user_from_model(
    model: users::Model,
    role: Option<roles::Model>,
) -> Result<User, ClinicServiceError> {
    let role = role.ok_or_else(|| anyhow::anyhow!("user {} has no role", model.id))?;
    Ok(User {
        id: model.id,
        email: model.email,
        name: model.name,
        is_active: model.is_active,
        is_staff: model.is_staff,
        is_superuser: model.is_superuser,
        role: role_from_model(role),
        address: model.address,
        phone_number: model.phone_number,
    })
}

// ── Patient repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPatientRepository {
    pub db: DatabaseConnection,
}

impl PatientRepository for DbPatientRepository {
    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, ClinicServiceError> {
        let mut query = patients::Entity::find();
        if let Some(ref name) = filter.name {
            query = query.filter(patients::Column::Name.starts_with(name.as_str()));
        }
        let models = query
            .order_by_asc(patients::Column::Id)
            .all(&self.db)
            .await
            .context("list patients")?;
        Ok(models.into_iter().map(patient_from_model).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Patient>, ClinicServiceError> {
        let model = patients::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find patient by id")?;
        Ok(model.map(patient_from_model))
    }

    async fn create(&self, fields: &PatientFields) -> Result<Patient, ClinicServiceError> {
        let model = patient_active_model(fields.clone())
            .insert(&self.db)
            .await
            .context("create patient")?;
        Ok(patient_from_model(model))
    }

    async fn update(&self, patient: &Patient) -> Result<bool, ClinicServiceError> {
        let result = patients::ActiveModel {
            id: Set(patient.id),
            name: Set(patient.name.clone()),
            relative: Set(patient.relative.clone()),
            relative_name: Set(patient.relative_name.clone()),
            phone_number: Set(patient.phone_number.clone()),
            birth_date: Set(patient.birth_date),
        }
        .update(&self.db)
        .await;
        Ok(row_updated(result).context("update patient")?)
    }

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError> {
        let result = patients::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete patient")?;
        Ok(result.rows_affected > 0)
    }

    async fn existing_names(
        &self,
        names: &[String],
    ) -> Result<HashSet<String>, ClinicServiceError> {
        let found: Vec<String> = patients::Entity::find()
            .select_only()
            .column(patients::Column::Name)
            .filter(patients::Column::Name.is_in(names.iter().cloned()))
            .into_tuple()
            .all(&self.db)
            .await
            .context("find existing patient names")?;
        Ok(found.into_iter().collect())
    }

    async fn create_many(&self, rows: &[PatientFields]) -> Result<u64, ClinicServiceError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let models = rows.iter().cloned().map(patient_active_model);
        let inserted = patients::Entity::insert_many(models)
            .exec_without_returning(&self.db)
            .await
            .context("bulk insert patients")?;
        Ok(inserted)
    }
}

fn patient_active_model(fields: PatientFields) -> patients::ActiveModel {
    patients::ActiveModel {
        name: Set(fields.name),
        relative: Set(fields.relative),
        relative_name: Set(fields.relative_name),
        phone_number: Set(fields.phone_number),
        birth_date: Set(fields.birth_date),
        ..Default::default()
    }
}

fn patient_from_model(model: patients::Model) -> Patient {
    Patient {
        id: model.id,
        name: model.name,
        relative: model.relative,
        relative_name: model.relative_name,
        phone_number: model.phone_number,
        birth_date: model.birth_date,
    }
}

// ── Reservation repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReservationRepository {
    pub db: DatabaseConnection,
}

impl ReservationRepository for DbReservationRepository {
    async fn list(
        &self,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>, ClinicServiceError> {
        let mut query =
            reservations::Entity::find().filter(reservations::Column::Date.eq(filter.date));
        if let Some(doctor_id) = filter.doctor_id {
            query = query.filter(reservations::Column::DoctorId.eq(doctor_id));
        }
        let models = query
            .order_by_asc(reservations::Column::Id)
            .all(&self.db)
            .await
            .context("list reservations")?;
        Ok(models.into_iter().map(reservation_from_model).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Reservation>, ClinicServiceError> {
        let model = reservations::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find reservation by id")?;
        Ok(model.map(reservation_from_model))
    }

    async fn create(&self, fields: &ReservationFields) -> Result<Reservation, ClinicServiceError> {
        let fields = fields.clone();
        let model = reservations::ActiveModel {
            patient_id: Set(fields.patient_id),
            doctor_id: Set(fields.doctor_id),
            date: Set(fields.date),
            time: Set(fields.time),
            description: Set(fields.description),
            requirements: Set(fields.requirements),
            patient_reminder: Set(fields.patient_reminder),
            doctor_reminder: Set(fields.doctor_reminder),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create reservation")?;
        Ok(reservation_from_model(model))
    }

    async fn update(&self, reservation: &Reservation) -> Result<bool, ClinicServiceError> {
        let r = reservation.clone();
        let result = reservations::ActiveModel {
            id: Set(r.id),
            patient_id: Set(r.patient_id),
            doctor_id: Set(r.doctor_id),
            date: Set(r.date),
            time: Set(r.time),
            description: Set(r.description),
            requirements: Set(r.requirements),
            patient_reminder: Set(r.patient_reminder),
            doctor_reminder: Set(r.doctor_reminder),
        }
        .update(&self.db)
        .await;
        Ok(row_updated(result).context("update reservation")?)
    }

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError> {
        let result = reservations::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete reservation")?;
        Ok(result.rows_affected > 0)
    }
}

fn reservation_from_model(model: reservations::Model) -> Reservation {
    Reservation {
        id: model.id,
        patient_id: model.patient_id,
        doctor_id: model.doctor_id,
        date: model.date,
        time: model.time,
        description: model.description,
        requirements: model.requirements,
        patient_reminder: model.patient_reminder,
        doctor_reminder: model.doctor_reminder,
    }
}

// ── Token repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTokenRepository {
    pub db: DatabaseConnection,
}

impl TokenRepository for DbTokenRepository {
    async fn get_or_create(
        &self,
        user_id: i32,
        candidate: &TokenKey,
    ) -> Result<TokenKey, ClinicServiceError> {
        auth_tokens::Entity::insert(auth_tokens::ActiveModel {
            key: Set(candidate.as_str().to_owned()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now()),
        })
        .on_conflict(
            OnConflict::column(auth_tokens::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert auth token")?;

        let model = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find auth token by user")?
            .ok_or_else(|| anyhow::anyhow!("auth token missing for user {user_id}"))?;
        let key = model
            .key
            .parse::<TokenKey>()
            .context("parse stored token key")?;
        Ok(key)
    }

    async fn principal(&self, key: &TokenKey) -> Result<Option<Principal>, ClinicServiceError> {
        let Some(token) = auth_tokens::Entity::find_by_id(key.as_str().to_owned())
            .one(&self.db)
            .await
            .context("find auth token")?
        else {
            return Ok(None);
        };
        let Some(user) = users::Entity::find_by_id(token.user_id)
            .one(&self.db)
            .await
            .context("find token owner")?
        else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        let group_ids: Vec<i32> = user_groups::Entity::find()
            .filter(user_groups::Column::UserId.eq(user.id))
            .all(&self.db)
            .await
            .context("list user groups")?
            .into_iter()
            .map(|m| m.group_id)
            .collect();

        let mut permissions: BTreeSet<Permission> = if group_ids.is_empty() {
            BTreeSet::new()
        } else {
            let models = permissions::Entity::find()
                .join(
                    JoinType::InnerJoin,
                    permissions::Relation::GroupPermissions.def(),
                )
                .filter(group_permissions::Column::GroupId.is_in(group_ids))
                .distinct()
                .all(&self.db)
                .await
                .context("list user permissions")?;
            parse_permissions(models).into_iter().collect()
        };
        // Superusers hold every standard permission regardless of groups.
        if user.is_superuser {
            permissions.extend(
                Permission::catalog()
                    .into_iter()
                    .filter(|p| p.action != Action::ViewOwn),
            );
        }

        Ok(Some(Principal {
            user_id: user.id,
            permissions,
        }))
    }
}
