//! Permission checks for the authenticated caller.
//!
//! Every use case asks the [`Principal`] for a [`Decision`] before touching
//! storage. Decisions compose with [`Decision::or_else`] and become a
//! `403` through [`Decision::require`].

use std::collections::BTreeSet;

use clinic_domain::permission::{Action, Permission, Resource};

use crate::error::ClinicServiceError;

/// The authenticated identity behind a request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i32,
    /// Union of the permissions of every group the user belongs to.
    pub permissions: BTreeSet<Permission>,
}

impl Principal {
    pub fn check(&self, permission: Permission) -> Decision {
        if self.permissions.contains(&permission) {
            Decision::Granted
        } else {
            Decision::Denied(permission)
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), ClinicServiceError> {
        self.check(permission).require()
    }

    /// Which reservations the caller may read.
    ///
    /// Holders of `view_own_reservation` only see their own rows, even when
    /// they also hold `view_reservation`.
    pub fn reservation_scope(&self) -> Result<ReadScope, ClinicServiceError> {
        let own = Permission::new(Resource::Reservation, Action::ViewOwn);
        self.check(own)
            .or_else(|| self.check(Permission::view(Resource::Reservation)))
            .require()?;
        if self.permissions.contains(&own) {
            Ok(ReadScope::Own(self.user_id))
        } else {
            Ok(ReadScope::All)
        }
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    /// Carries the permission that was missing.
    Denied(Permission),
}

impl Decision {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Logical OR. `other` is only evaluated when `self` is denied; if both
    /// are denied the first missing permission is reported.
    pub fn or_else(self, other: impl FnOnce() -> Decision) -> Decision {
        match self {
            Self::Granted => Self::Granted,
            Self::Denied(first) => match other() {
                Self::Granted => Self::Granted,
                Self::Denied(_) => Self::Denied(first),
            },
        }
    }

    pub fn require(self) -> Result<(), ClinicServiceError> {
        match self {
            Self::Granted => Ok(()),
            Self::Denied(permission) => {
                Err(ClinicServiceError::PermissionDenied(permission.codename()))
            }
        }
    }
}

/// Row scope for reservation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    All,
    /// Only reservations whose doctor is this user.
    Own(i32),
}

impl ReadScope {
    pub fn doctor_id(self) -> Option<i32> {
        match self {
            Self::All => None,
            Self::Own(id) => Some(id),
        }
    }
}
