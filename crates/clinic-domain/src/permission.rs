//! Permission catalog.
//!
//! A permission is a `(resource, action)` pair. Its wire form is the codename
//! `<action>_<resource>` (e.g. `view_patient`, `view_own_reservation`), which
//! is what gets persisted in the `permissions` table and reported in 403s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A protected resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    User,
    Patient,
    Reservation,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Self::User, Self::Patient, Self::Reservation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Patient => "patient",
            Self::Reservation => "reservation",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    /// Read access restricted to rows owned by the caller.
    ViewOwn,
    Add,
    Change,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Self::View,
        Self::ViewOwn,
        Self::Add,
        Self::Change,
        Self::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::ViewOwn => "view_own",
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
        }
    }
}

/// Error returned when parsing a codename outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission codename: {0}")]
pub struct UnknownCodename(pub String);

/// A single permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    pub const fn view(resource: Resource) -> Self {
        Self::new(resource, Action::View)
    }

    pub const fn add(resource: Resource) -> Self {
        Self::new(resource, Action::Add)
    }

    pub const fn change(resource: Resource) -> Self {
        Self::new(resource, Action::Change)
    }

    pub const fn delete(resource: Resource) -> Self {
        Self::new(resource, Action::Delete)
    }

    /// `view_own` only exists for reservations, the one resource with an owner.
    pub fn exists(self) -> bool {
        match self.action {
            Action::ViewOwn => self.resource == Resource::Reservation,
            _ => true,
        }
    }

    pub fn codename(self) -> String {
        format!("{}_{}", self.action.as_str(), self.resource.as_str())
    }

    /// Every permission known to the system, ordered by resource then action.
    pub fn catalog() -> Vec<Permission> {
        Resource::ALL
            .into_iter()
            .flat_map(Self::for_resource)
            .collect()
    }

    /// The full permission set scoped to one resource.
    pub fn for_resource(resource: Resource) -> Vec<Permission> {
        Action::ALL
            .into_iter()
            .map(|action| Self::new(resource, action))
            .filter(|p| p.exists())
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.action.as_str(), self.resource.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownCodename;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCodename(s.to_owned());
        let (action, resource) = s.rsplit_once('_').ok_or_else(unknown)?;
        let resource = Resource::from_name(resource).ok_or_else(unknown)?;
        let action = Action::ALL
            .into_iter()
            .find(|a| a.as_str() == action)
            .ok_or_else(unknown)?;
        let permission = Self::new(resource, action);
        if !permission.exists() {
            return Err(unknown());
        }
        Ok(permission)
    }
}
