//! Staff role vocabulary.

use serde::{Deserialize, Serialize};

use crate::group::Group;

/// One of the roles created by the seeder.
///
/// Roles are rows in the `roles` table and administrators may add more, so
/// code that handles arbitrary role names goes through [`group_for_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Admin,
    Doctor,
    Receptionist,
}

impl RoleKind {
    /// Seeding order. The first entry is the superuser's role.
    pub const ALL: [RoleKind; 3] = [Self::Admin, Self::Doctor, Self::Receptionist];

    pub fn name(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Doctor => "Doctor",
            Self::Receptionist => "Receptionist",
        }
    }

    /// Exact, case-sensitive match on the persisted role name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    pub fn group(self) -> Group {
        match self {
            Self::Admin => Group::Admins,
            Self::Doctor => Group::Doctors,
            Self::Receptionist => Group::Receptionists,
        }
    }
}

/// Group a user with the given role name belongs to.
///
/// Admin → admins_group, Doctor → doctors_group, any other role → receptionist_group.
pub fn group_for_role(role_name: &str) -> Group {
    match RoleKind::from_name(role_name) {
        Some(RoleKind::Admin) => Group::Admins,
        Some(RoleKind::Doctor) => Group::Doctors,
        _ => Group::Receptionists,
    }
}

/// Whether a role name is the doctor role. Reservations may only reference doctors.
pub fn is_doctor(role_name: &str) -> bool {
    RoleKind::from_name(role_name) == Some(RoleKind::Doctor)
}
