use clinic_domain::group::Group;
use clinic_domain::permission::Resource;
use clinic_domain::role::RoleKind;

use crate::domain::repository::{AccessRepository, PasswordHasher, UserRepository};
use crate::domain::types::{
    FieldErrors, MIN_PASSWORD_LEN, NewUser, Role, is_valid_email, normalize_email,
};
use crate::error::ClinicServiceError;

// ── SeedRolesAndGroups ───────────────────────────────────────────────────────

/// Bootstrap account created by the seeder.
#[derive(Debug, Clone)]
pub struct SuperuserInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuperuserOutcome {
    Created(i32),
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: usize,
    pub groups_created: usize,
    pub grants_added: usize,
    pub superuser: SuperuserOutcome,
}

pub struct SeedUseCase<A: AccessRepository, U: UserRepository, H: PasswordHasher> {
    pub access: A,
    pub users: U,
    pub hasher: H,
}

impl<A, U, H> SeedUseCase<A, U, H>
where
    A: AccessRepository,
    U: UserRepository,
    H: PasswordHasher,
{
    /// Idempotent: a second run creates nothing and grants nothing.
    pub async fn execute(
        &self,
        superuser: SuperuserInput,
    ) -> Result<SeedReport, ClinicServiceError> {
        let superuser = validate_superuser(superuser)?;

        let mut roles_created = 0;
        let mut admin_role: Option<Role> = None;
        for kind in RoleKind::ALL {
            let (role, created) = self.access.ensure_role(kind.name()).await?;
            if created {
                roles_created += 1;
            }
            if kind == RoleKind::Admin {
                admin_role = Some(role);
            }
        }

        let mut groups_created = 0;
        for group in Group::ALL {
            if self.access.ensure_group(group).await? {
                groups_created += 1;
            }
        }

        let mut grants_added = 0;
        for resource in Resource::ALL {
            let available = self.access.permissions_for(resource).await?;
            if available.is_empty() {
                return Err(ClinicServiceError::MissingPermissions {
                    resource: resource.to_string(),
                });
            }
            for group in Group::ALL {
                for permission in group.select(&available) {
                    if self.access.grant(group, permission).await? {
                        grants_added += 1;
                    }
                }
            }
        }

        let admin_role = admin_role
            .ok_or_else(|| anyhow::anyhow!("admin role missing after seeding"))?;
        let superuser = self.ensure_superuser(superuser, admin_role).await?;

        Ok(SeedReport {
            roles_created,
            groups_created,
            grants_added,
            superuser,
        })
    }

    async fn ensure_superuser(
        &self,
        input: SuperuserInput,
        role: Role,
    ) -> Result<SuperuserOutcome, ClinicServiceError> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Ok(SuperuserOutcome::AlreadyPresent);
        }
        let password_hash = self.hasher.hash(&input.password).await?;
        let group = RoleKind::Admin.group();
        let user = self
            .users
            .create(
                &NewUser {
                    email: input.email,
                    name: input.name,
                    password_hash,
                    role,
                    is_staff: true,
                    is_superuser: true,
                    address: None,
                    phone_number: None,
                },
                group,
            )
            .await?;
        Ok(SuperuserOutcome::Created(user.id))
    }
}

fn validate_superuser(input: SuperuserInput) -> Result<SuperuserInput, ClinicServiceError> {
    let email = normalize_email(&input.email);
    let mut errors = FieldErrors::default();
    if !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    errors.into_result()?;
    let name = match input.name.trim() {
        "" => email.clone(),
        name => name.to_owned(),
    };
    Ok(SuperuserInput {
        email,
        password: input.password,
        name,
    })
}
