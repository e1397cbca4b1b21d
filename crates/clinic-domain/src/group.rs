//! Staff groups and the policy table that binds them to permissions.

use serde::{Deserialize, Serialize};

use crate::permission::{Action, Permission, Resource};

/// A named bundle of permissions. Users inherit permissions through membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Admins,
    Doctors,
    Receptionists,
}

/// `(group, resource, action)` rows that are allowed. Anything absent is denied.
///
/// `view_own_reservation` narrows reads to the caller's own rows, so it is
/// granted to doctors only. Holding it alongside `view_reservation` still
/// restricts the result set.
const POLICY: &[(Group, Resource, Action)] = &[
    // admins_group: full access, without the narrowing view_own
    (Group::Admins, Resource::User, Action::View),
    (Group::Admins, Resource::User, Action::Add),
    (Group::Admins, Resource::User, Action::Change),
    (Group::Admins, Resource::User, Action::Delete),
    (Group::Admins, Resource::Patient, Action::View),
    (Group::Admins, Resource::Patient, Action::Add),
    (Group::Admins, Resource::Patient, Action::Change),
    (Group::Admins, Resource::Patient, Action::Delete),
    (Group::Admins, Resource::Reservation, Action::View),
    (Group::Admins, Resource::Reservation, Action::Add),
    (Group::Admins, Resource::Reservation, Action::Change),
    (Group::Admins, Resource::Reservation, Action::Delete),
    // doctors_group: read only
    (Group::Doctors, Resource::User, Action::View),
    (Group::Doctors, Resource::Patient, Action::View),
    (Group::Doctors, Resource::Reservation, Action::View),
    (Group::Doctors, Resource::Reservation, Action::ViewOwn),
    // receptionist_group: everything except delete
    (Group::Receptionists, Resource::User, Action::View),
    (Group::Receptionists, Resource::User, Action::Add),
    (Group::Receptionists, Resource::User, Action::Change),
    (Group::Receptionists, Resource::Patient, Action::View),
    (Group::Receptionists, Resource::Patient, Action::Add),
    (Group::Receptionists, Resource::Patient, Action::Change),
    (Group::Receptionists, Resource::Reservation, Action::View),
    (Group::Receptionists, Resource::Reservation, Action::Add),
    (Group::Receptionists, Resource::Reservation, Action::Change),
];

impl Group {
    pub const ALL: [Group; 3] = [Self::Admins, Self::Doctors, Self::Receptionists];

    /// Persisted group name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Admins => "admins_group",
            Self::Doctors => "doctors_group",
            Self::Receptionists => "receptionist_group",
        }
    }

    pub fn grants(self, permission: Permission) -> bool {
        POLICY.iter().any(|&(group, resource, action)| {
            group == self && resource == permission.resource && action == permission.action
        })
    }

    /// Permissions this group receives out of `available`.
    pub fn select<'a>(
        self,
        available: impl IntoIterator<Item = &'a Permission>,
    ) -> Vec<Permission> {
        available
            .into_iter()
            .copied()
            .filter(|p| self.grants(*p))
            .collect()
    }
}
