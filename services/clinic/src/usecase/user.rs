use clinic_domain::permission::{Permission, Resource};
use clinic_domain::role::group_for_role;

use crate::domain::guard::Principal;
use crate::domain::repository::{AccessRepository, PasswordHasher, UserRepository};
use crate::domain::types::{
    BLANK, FieldErrors, INVALID_PHONE_NUMBER, MIN_PASSWORD_LEN, NewUser, REQUIRED, Role, User,
    UserChanges, UserFilter, WriteMode, is_valid_email, is_valid_phone_number, missing_pk,
    normalize_email,
};
use crate::error::ClinicServiceError;

const RESOURCE: Resource = Resource::User;

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(
        &self,
        principal: &Principal,
        filter: UserFilter,
    ) -> Result<Vec<User>, ClinicServiceError> {
        principal.require(Permission::view(RESOURCE))?;
        self.users.list(&filter).await
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, principal: &Principal, id: i32) -> Result<User, ClinicServiceError> {
        principal.require(Permission::view(RESOURCE))?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ClinicServiceError::UserNotFound)
    }
}

// ── CreateUser / UpdateUser ─────────────────────────────────────────────────

/// User fields as sent by a client. `None` means the field was absent;
/// `Some(None)` on `address` or `phone_number` means an explicit null.
#[derive(Default)]
pub struct UserInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i32>,
    pub address: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
}

pub struct CreateUserUseCase<U: UserRepository, A: AccessRepository, H: PasswordHasher> {
    pub users: U,
    pub access: A,
    pub hasher: H,
}

impl<U, A, H> CreateUserUseCase<U, A, H>
where
    U: UserRepository,
    A: AccessRepository,
    H: PasswordHasher,
{
    /// Persist the user and enroll it in the group mapped from its role.
    pub async fn execute(
        &self,
        principal: &Principal,
        input: UserInput,
    ) -> Result<User, ClinicServiceError> {
        principal.require(Permission::add(RESOURCE))?;

        let mut errors = FieldErrors::default();
        let email = match input.email {
            Some(ref email) => Some(check_email(&self.users, email, None, &mut errors).await?),
            None => required("email", &mut errors),
        };
        match input.name {
            Some(ref name) => check_name(name, &mut errors),
            None => errors.add("name", REQUIRED),
        }
        match input.password {
            Some(ref password) => check_password(password, &mut errors),
            None => errors.add("password", REQUIRED),
        }
        let phone_number = input.phone_number.flatten();
        check_phone_number(phone_number.as_deref(), &mut errors);
        let role = match input.role_id {
            Some(id) => check_role(&self.access, id, &mut errors).await?,
            None => required("role", &mut errors),
        };

        let (email, name, password, role) = match (email, input.name, input.password, role) {
            (Some(email), Some(name), Some(password), Some(role)) if errors.is_empty() => {
                (email, name, password, role)
            }
            _ => return Err(ClinicServiceError::Validation(errors.into_messages())),
        };

        let password_hash = self.hasher.hash(&password).await?;
        let group = group_for_role(&role.name);
        let user = self
            .users
            .create(
                &NewUser {
                    email,
                    name: name.trim().to_owned(),
                    password_hash,
                    role,
                    is_staff: false,
                    is_superuser: false,
                    address: input.address.flatten(),
                    phone_number,
                },
                group,
            )
            .await?;
        tracing::info!(user_id = user.id, group = group.name(), "user created");
        Ok(user)
    }
}

pub struct UpdateUserUseCase<U: UserRepository, A: AccessRepository, H: PasswordHasher> {
    pub users: U,
    pub access: A,
    pub hasher: H,
}

impl<U, A, H> UpdateUserUseCase<U, A, H>
where
    U: UserRepository,
    A: AccessRepository,
    H: PasswordHasher,
{
    /// A role change moves the user into the matching group.
    ///
    /// Replace requires email, name and role, and clears an absent address or
    /// phone number. The password is only changed when one is sent.
    pub async fn execute(
        &self,
        principal: &Principal,
        id: i32,
        mut input: UserInput,
        mode: WriteMode,
    ) -> Result<User, ClinicServiceError> {
        principal.require(Permission::change(RESOURCE))?;
        let current = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ClinicServiceError::UserNotFound)?;

        let mut errors = FieldErrors::default();
        if mode == WriteMode::Replace {
            if input.email.is_none() {
                errors.add("email", REQUIRED);
            }
            if input.name.is_none() {
                errors.add("name", REQUIRED);
            }
            if input.role_id.is_none() {
                errors.add("role", REQUIRED);
            }
            input.address = Some(input.address.flatten());
            input.phone_number = Some(input.phone_number.flatten());
        }
        let email = match input.email {
            Some(ref email) => {
                Some(check_email(&self.users, email, Some(id), &mut errors).await?)
            }
            None => None,
        };
        if let Some(ref name) = input.name {
            check_name(name, &mut errors);
        }
        if let Some(ref password) = input.password {
            check_password(password, &mut errors);
        }
        if let Some(Some(ref phone_number)) = input.phone_number {
            check_phone_number(Some(phone_number), &mut errors);
        }
        let role = match input.role_id {
            Some(role_id) => check_role(&self.access, role_id, &mut errors).await?,
            None => None,
        };
        errors.into_result()?;

        let password_hash = match input.password {
            Some(ref password) => Some(self.hasher.hash(password).await?),
            None => None,
        };
        let group = role.as_ref().map(|r| group_for_role(&r.name));
        if let Some(ref role) = role {
            if role.id != current.role.id {
                tracing::info!(user_id = id, role = %role.name, "user role changed");
            }
        }
        let changes = UserChanges {
            email,
            name: input.name.map(|n| n.trim().to_owned()),
            password_hash,
            role,
            address: input.address,
            phone_number: input.phone_number,
        };
        self.users
            .update(id, &changes, group)
            .await?
            .ok_or(ClinicServiceError::UserNotFound)
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, principal: &Principal, id: i32) -> Result<(), ClinicServiceError> {
        principal.require(Permission::delete(RESOURCE))?;
        if !self.users.delete(id).await? {
            return Err(ClinicServiceError::UserNotFound);
        }
        Ok(())
    }
}

// ── Field checks ─────────────────────────────────────────────────────────────

fn required<T>(field: &str, errors: &mut FieldErrors) -> Option<T> {
    errors.add(field, REQUIRED);
    None
}

async fn check_email<U: UserRepository>(
    users: &U,
    email: &str,
    except: Option<i32>,
    errors: &mut FieldErrors,
) -> Result<String, ClinicServiceError> {
    let email = normalize_email(email);
    if email.is_empty() {
        errors.add("email", BLANK);
    } else if !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    } else if let Some(existing) = users.find_by_email(&email).await? {
        if Some(existing.id) != except {
            errors.add("email", "user with this email already exists.");
        }
    }
    Ok(email)
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    if name.trim().is_empty() {
        errors.add("name", BLANK);
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
        );
    }
}

fn check_phone_number(phone_number: Option<&str>, errors: &mut FieldErrors) {
    if let Some(phone_number) = phone_number {
        if !is_valid_phone_number(phone_number) {
            errors.add("phone_number", INVALID_PHONE_NUMBER);
        }
    }
}

async fn check_role<A: AccessRepository>(
    access: &A,
    role_id: i32,
    errors: &mut FieldErrors,
) -> Result<Option<Role>, ClinicServiceError> {
    let role = access.find_role(role_id).await?;
    if role.is_none() {
        errors.add("role", missing_pk(role_id));
    }
    Ok(role)
}
